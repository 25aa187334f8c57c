use std::{future::Future, io::Write};

use kube::{api::DynamicObject, Api, Client, Resource, ResourceExt};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    diff::{self, DiffOptions},
    discovery::{self, ResourceId},
    error::Error,
    informer::{watch_all, Informer, ResourceEventHandler},
};

/// Prints a colored diff for every update and nothing for adds or deletes.
pub struct DiffPrinter<W> {
    out: W,
    options: DiffOptions,
}

impl<W: Write> DiffPrinter<W> {
    pub fn new(out: W, options: DiffOptions) -> Self {
        DiffPrinter { out, options }
    }
}

impl<K, W> ResourceEventHandler<K> for DiffPrinter<W>
where
    K: Resource + Serialize + Clone,
    W: Write,
{
    fn on_add(&mut self, obj: &K) {
        debug!("added {}", obj.name_any());
    }

    fn on_update(&mut self, old: &K, new: &K) {
        let diff = match diff::render(old, new, self.options) {
            Ok(diff) => diff,
            Err(e) => {
                error!("unable to diff {}: {e}", new.name_any());
                return;
            }
        };

        if diff.is_empty() {
            debug!("{} updated without visible changes", new.name_any());
            return;
        }

        if let Err(e) = writeln!(self.out, "{}", diff::colorize(&diff)) {
            error!("unable to write diff: {e}");
        }
    }

    fn on_delete(&mut self, obj: &K) {
        debug!("deleted {}", obj.name_any());
    }
}

/// Watches `target` across all namespaces, printing diffs to stdout until `shutdown` resolves.
pub async fn watch(
    client: Client,
    target: &str,
    options: DiffOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    let id: ResourceId = target.parse()?;
    let ar = discovery::resolve(&client, &id).await?;

    info!("watching {id} ({}) in all namespaces", ar.kind);

    let api = Api::<DynamicObject>::all_with(client, &ar);
    let mut printer = DiffPrinter::new(std::io::stdout(), options);

    Informer::<DynamicObject>::new(ar)
        .run(watch_all(api), &mut printer, shutdown)
        .await;

    info!("stopped watching {id}");
    Ok(())
}
