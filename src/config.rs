use std::path::{Path, PathBuf};

use clap::Parser;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use tracing::debug;

use crate::error::Error;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Kubeconfig file, or a list of files joined like `PATH`, merged in order.
    /// Falls back to in-cluster or default config when unset.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one.
    #[arg(long, env = "KUBEWATCHER_CONTEXT")]
    pub context: Option<String>,

    /// Resource to watch, as <resource>.<version>.<group>. Skips the interactive prompt.
    #[arg(long, env = "KUBEWATCHER_RESOURCE")]
    pub resource: Option<String>,

    /// Keep metadata.managedFields in the printed diffs.
    #[arg(long, env = "KUBEWATCHER_MANAGED_FIELDS")]
    pub managed_fields: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// The preset resource identifier, ignoring an empty variable.
    pub fn preset_resource(&self) -> Option<&str> {
        self.resource.as_deref().filter(|target| !target.is_empty())
    }

    pub async fn client(&self) -> Result<Client, Error> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..KubeConfigOptions::default()
        };

        let kubeconfig = match &self.kubeconfig {
            Some(paths) => read_kubeconfigs(paths)?,
            None => None,
        };

        let config = match kubeconfig {
            Some(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &options).await?,
            None if options.context.is_some() => Config::from_kubeconfig(&options).await?,
            None => Config::infer().await?,
        };

        Ok(Client::try_from(config)?)
    }
}

/// Reads every file in a `PATH`-style list and merges them, earlier files winning.
fn read_kubeconfigs(paths: &Path) -> Result<Option<Kubeconfig>, Error> {
    let mut merged: Option<Kubeconfig> = None;

    for path in std::env::split_paths(paths).filter(|p| !p.as_os_str().is_empty()) {
        debug!("loading kubeconfig from {}", path.display());
        let next = Kubeconfig::read_from(&path).map_err(|source| Error::Kubeconfig {
            path: path.clone(),
            source,
        })?;

        merged = Some(match merged {
            Some(kubeconfig) => kubeconfig.merge(next)?,
            None => next,
        });
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use clap::Parser;

    use super::{read_kubeconfigs, Args};
    use crate::error::Error;

    fn write_kubeconfig(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(format!("{name}.yaml"));
        fs::write(
            &path,
            indoc::formatdoc! {"
                apiVersion: v1
                kind: Config
                clusters:
                - name: {name}
                  cluster:
                    server: https://{name}.example:6443
                contexts:
                - name: {name}
                  context:
                    cluster: {name}
                    user: {name}
                users:
                - name: {name}
                  user:
                    token: secret
                current-context: {name}
            "},
        )
        .unwrap();
        path
    }

    #[test]
    fn optional_flags_default_off() {
        let args = Args::try_parse_from(["kubewatcher"]).unwrap();

        assert!(!args.managed_fields);
        assert!(!args.no_color);
    }

    #[test]
    fn resource_flag_is_preset() {
        let args =
            Args::try_parse_from(["kubewatcher", "--resource", "deployments.v1.apps"]).unwrap();

        assert_eq!(args.preset_resource(), Some("deployments.v1.apps"));
    }

    #[test]
    fn empty_resource_is_not_preset() {
        let args = Args::try_parse_from(["kubewatcher", "--resource", ""]).unwrap();

        assert_eq!(args.preset_resource(), None);
    }

    #[test]
    fn kubeconfig_lists_are_merged_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_kubeconfig(dir.path(), "first");
        let second = write_kubeconfig(dir.path(), "second");
        let joined = std::env::join_paths([first, second]).unwrap();

        let kubeconfig = read_kubeconfigs(Path::new(&joined)).unwrap().unwrap();

        assert_eq!(kubeconfig.contexts.len(), 2);
        assert_eq!(kubeconfig.current_context.as_deref(), Some("first"));
    }

    #[test]
    fn single_kubeconfig_is_read_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let only = write_kubeconfig(dir.path(), "only");

        let kubeconfig = read_kubeconfigs(&only).unwrap().unwrap();

        assert_eq!(kubeconfig.contexts.len(), 1);
        assert_eq!(kubeconfig.current_context.as_deref(), Some("only"));
    }

    #[test]
    fn empty_kubeconfig_list_falls_back() {
        assert!(read_kubeconfigs(Path::new("")).unwrap().is_none());
    }

    #[test]
    fn missing_kubeconfig_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");

        match read_kubeconfigs(&missing) {
            Err(Error::Kubeconfig { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected a kubeconfig error, got {other:?}"),
        }
    }
}
