use std::{fmt, str::FromStr};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::{
    discovery::{verbs, ApiResource},
    Client,
};
use tracing::{debug, error, warn};

use crate::error::Error;

/// A resource type as the user names it: `<resource>.<version>.<group>`.
///
/// The group is empty for the core API, so pods are `pods.v1.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub resource: String,
    pub version: String,
    pub group: String,
}

impl ResourceId {
    fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.resource, self.version, self.group)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(resource), Some(version), Some(group))
                if !resource.is_empty() && !version.is_empty() =>
            {
                Ok(ResourceId {
                    resource: resource.to_string(),
                    version: version.to_string(),
                    group: group.to_string(),
                })
            }
            _ => Err(Error::InvalidResource(s.to_string())),
        }
    }
}

/// Source of the resource lists served by a cluster.
pub trait Discover {
    async fn resource_lists(&self) -> Result<Vec<APIResourceList>, Error>;
}

impl Discover for Client {
    async fn resource_lists(&self) -> Result<Vec<APIResourceList>, Error> {
        let mut lists = Vec::new();

        for version in self.list_core_api_versions().await?.versions {
            match self.list_core_api_resources(&version).await {
                Ok(list) => lists.push(list),
                Err(e) => warn!("skipping core api {version}: {e}"),
            }
        }

        for group in self.list_api_groups().await?.groups {
            for version in group.versions {
                match self.list_api_group_resources(&version.group_version).await {
                    Ok(list) => lists.push(list),
                    // Take a look at `kubectl get apiservices` if this keeps happening
                    Err(e) => warn!("skipping api {}: {e}", version.group_version),
                }
            }
        }

        Ok(lists)
    }
}

/// Splits a `groupVersion` into its group and version.
fn split_group_version(group_version: &str) -> Option<(&str, &str)> {
    let mut split = group_version.split('/');

    match (split.next(), split.next(), split.next()) {
        (Some(version), None, None) => Some(("", version)),
        (Some(group), Some(version), None) => Some((group, version)),
        _ => None,
    }
}

/// Builds the sorted list of identifiers the user can choose from.
///
/// Subresources (`pods/log`, `deployments/scale`, ...) cannot be watched on
/// their own and are left out.
pub fn resource_choices(lists: &[APIResourceList]) -> Vec<String> {
    let mut choices: Vec<String> = lists
        .iter()
        .flat_map(|list| {
            let (group, version) = split_group_version(&list.group_version).unwrap_or_else(|| {
                error!("unknown format: {}", list.group_version);
                ("", "")
            });

            list.resources
                .iter()
                .filter(|resource| !resource.name.contains('/'))
                .map(move |resource| {
                    ResourceId {
                        resource: resource.name.clone(),
                        version: version.to_string(),
                        group: group.to_string(),
                    }
                    .to_string()
                })
        })
        .collect();

    choices.sort();
    choices
}

fn to_api_resource(id: &ResourceId, resource: &APIResource) -> ApiResource {
    ApiResource {
        group: id.group.clone(),
        version: id.version.clone(),
        api_version: id.api_version(),
        kind: resource.kind.clone(),
        plural: resource.name.clone(),
    }
}

/// Looks up the served definition of `id`, which the watch needs for its kind and url.
pub async fn resolve(client: &Client, id: &ResourceId) -> Result<ApiResource, Error> {
    let api_version = id.api_version();
    let list = if id.group.is_empty() {
        client.list_core_api_resources(&api_version).await?
    } else {
        client.list_api_group_resources(&api_version).await?
    };

    find_resource(&list, id)
}

fn find_resource(list: &APIResourceList, id: &ResourceId) -> Result<ApiResource, Error> {
    let Some(resource) = list.resources.iter().find(|r| r.name == id.resource) else {
        return Err(Error::UnknownResource(id.to_string()));
    };

    let watchable = [verbs::LIST, verbs::WATCH]
        .iter()
        .all(|verb| resource.verbs.iter().any(|v| v.as_str() == *verb));
    if !watchable {
        return Err(Error::NotWatchable(id.to_string()));
    }

    debug!("resolved {id} to kind {}", resource.kind);
    Ok(to_api_resource(id, resource))
}
