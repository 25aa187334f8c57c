use std::{collections::HashSet, fmt::Debug, future::Future, hash::Hash, pin::pin};

use futures::{Stream, StreamExt};
use kube::{
    runtime::{
        reflector::{store::Writer, ObjectRef, Store},
        watcher::{self, Event},
        WatchStreamExt,
    },
    Api, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

/// Callbacks fired as the cached view of a resource type changes.
pub trait ResourceEventHandler<K> {
    fn on_add(&mut self, _obj: &K) {}

    fn on_update(&mut self, old: &K, new: &K);

    fn on_delete(&mut self, _obj: &K) {}
}

/// Watch every namespace for `api`'s resource, reconnecting with the default backoff.
pub fn watch_all<K>(api: Api<K>) -> impl Stream<Item = Result<Event<K>, watcher::Error>>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
{
    watcher::watcher(api, watcher::Config::default()).default_backoff()
}

/// Keeps a reflector store of the watched objects and translates watch
/// events into add/update/delete calls by comparing against the store
/// before it is updated.
pub struct Informer<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    dyntype: K::DynamicType,
    writer: Writer<K>,
    reader: Store<K>,
}

impl<K> Informer<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    pub fn new(dyntype: K::DynamicType) -> Self {
        let writer = Writer::new(dyntype.clone());
        let reader = writer.as_reader();

        Informer {
            dyntype,
            writer,
            reader,
        }
    }

    fn key(&self, obj: &K) -> ObjectRef<K> {
        ObjectRef::from_obj_with(obj, self.dyntype.clone())
    }

    fn applied(&self, obj: &K, handler: &mut impl ResourceEventHandler<K>) {
        match self.reader.get(&self.key(obj)) {
            None => handler.on_add(obj),
            Some(old) if old.resource_version() == obj.resource_version() => {
                trace!("{} unchanged at {:?}", obj.name_any(), obj.resource_version());
            }
            Some(old) => handler.on_update(&old, obj),
        }
    }

    fn dispatch(&mut self, event: &Event<K>, handler: &mut impl ResourceEventHandler<K>) {
        match event {
            Event::Applied(obj) => self.applied(obj, handler),
            Event::Deleted(obj) => handler.on_delete(obj),
            Event::Restarted(objs) => {
                debug!("watch (re)started with {} objects", objs.len());

                let listed: HashSet<_> = objs.iter().map(|obj| self.key(obj)).collect();
                for cached in self.reader.state() {
                    if !listed.contains(&self.key(&cached)) {
                        handler.on_delete(&cached);
                    }
                }

                for obj in objs {
                    self.applied(obj, handler);
                }
            }
        }

        self.writer.apply_watcher_event(event);
    }

    /// Consumes `events` until it ends or `shutdown` resolves.
    pub async fn run<S, H>(mut self, events: S, handler: &mut H, shutdown: impl Future<Output = ()>)
    where
        S: Stream<Item = Result<Event<K>, watcher::Error>>,
        H: ResourceEventHandler<K>,
    {
        let mut events = pin!(events.take_until(shutdown));

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => self.dispatch(&event, handler),
                Err(e) => warn!("watch failed: {e}"),
            }
        }
    }
}
