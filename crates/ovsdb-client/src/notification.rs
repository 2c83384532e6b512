//! Server-pushed notifications: `update`, `locked` and `stolen`

use serde::Deserialize;
use serde_json::Value;

use ovsdb_core::{Error, Id, Result, TableUpdates};

/// Receives the notifications of one session.
///
/// Every method defaults to doing nothing, so implementors only override
/// what they care about. Callbacks run inline on the session's dispatch
/// task; a slow callback delays every reply on that connection. An error
/// returned from a callback is logged and otherwise ignored.
pub trait NotificationHandler: Send + Sync {
    /// Changes in tables monitored under `value`
    fn update(&self, value: &Value, updates: &TableUpdates) -> anyhow::Result<()> {
        let _ = (value, updates);
        Ok(())
    }

    /// A lock requested earlier with `lock` has been granted
    fn locked(&self, lock: &Id) -> anyhow::Result<()> {
        let _ = lock;
        Ok(())
    }

    /// Another client stole a lock this session owned
    fn stolen(&self, lock: &Id) -> anyhow::Result<()> {
        let _ = lock;
        Ok(())
    }
}

/// The handler used until one is set: ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl NotificationHandler for NoopHandler {}

type UpdateFn = Box<dyn Fn(&Value, &TableUpdates) -> anyhow::Result<()> + Send + Sync>;
type LockFn = Box<dyn Fn(&Id) -> anyhow::Result<()> + Send + Sync>;

/// A [`NotificationHandler`] built from optional closures
#[derive(Default)]
pub struct HandlerFns {
    update: Option<UpdateFn>,
    locked: Option<LockFn>,
    stolen: Option<LockFn>,
}

impl HandlerFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &TableUpdates) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_locked<F>(mut self, f: F) -> Self
    where
        F: Fn(&Id) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.locked = Some(Box::new(f));
        self
    }

    pub fn on_stolen<F>(mut self, f: F) -> Self
    where
        F: Fn(&Id) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.stolen = Some(Box::new(f));
        self
    }
}

impl NotificationHandler for HandlerFns {
    fn update(&self, value: &Value, updates: &TableUpdates) -> anyhow::Result<()> {
        match &self.update {
            Some(f) => f(value, updates),
            None => Ok(()),
        }
    }

    fn locked(&self, lock: &Id) -> anyhow::Result<()> {
        match &self.locked {
            Some(f) => f(lock),
            None => Ok(()),
        }
    }

    fn stolen(&self, lock: &Id) -> anyhow::Result<()> {
        match &self.stolen {
            Some(f) => f(lock),
            None => Ok(()),
        }
    }
}

/// A decoded notification
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// `"params": [<json-value>, <table-updates>]`
    Update { value: Value, updates: TableUpdates },
    /// `"params": [<id>]`
    Locked(Id),
    /// `"params": [<id>]`
    Stolen(Id),
}

impl Notification {
    /// Decode the params of an inbound method; `None` if the method is not
    /// a notification this client handles
    pub fn parse(method: &str, params: &Value) -> Result<Option<Self>> {
        let params = params.as_array().map(Vec::as_slice).unwrap_or_default();
        match method {
            "update" => {
                let [value, updates] = params else {
                    return Err(Error::protocol(
                        "invalid update notification: wrong number of parameters",
                    ));
                };
                let updates = TableUpdates::deserialize(updates).map_err(|e| {
                    Error::protocol(format!("failed to decode <table-updates>: {}", e))
                })?;
                Ok(Some(Notification::Update {
                    value: value.clone(),
                    updates,
                }))
            }
            "locked" => Ok(Some(Notification::Locked(lock_param(method, params)?))),
            "stolen" => Ok(Some(Notification::Stolen(lock_param(method, params)?))),
            _ => Ok(None),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Notification::Update { .. } => "update",
            Notification::Locked(_) => "locked",
            Notification::Stolen(_) => "stolen",
        }
    }

    /// Invoke the matching callback of `handler`
    pub fn deliver(&self, handler: &dyn NotificationHandler) -> anyhow::Result<()> {
        match self {
            Notification::Update { value, updates } => handler.update(value, updates),
            Notification::Locked(lock) => handler.locked(lock),
            Notification::Stolen(lock) => handler.stolen(lock),
        }
    }
}

fn lock_param(method: &str, params: &[Value]) -> Result<Id> {
    match params {
        [Value::String(lock)] => Id::new(lock.as_str())
            .map_err(|_| Error::protocol(format!("invalid {} notification: wrong lock name", method))),
        [_] => Err(Error::protocol(format!(
            "invalid {} notification: wrong lock name",
            method
        ))),
        _ => Err(Error::protocol(format!(
            "invalid {} notification: wrong number of parameters",
            method
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_update() {
        let params = json!([
            "monid",
            {"Bridge": {"550e8400-e29b-41d4-a716-446655440000": {"new": {"name": "br0"}}}}
        ]);
        let notification = Notification::parse("update", &params).unwrap().unwrap();
        let Notification::Update { value, updates } = notification else {
            panic!("expected update");
        };
        assert_eq!(value, json!("monid"));
        assert_eq!(updates["Bridge"].len(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_params() {
        assert!(Notification::parse("update", &json!(["monid"])).is_err());
        assert!(Notification::parse("update", &json!(["monid", {"Bridge": 1}])).is_err());
        assert!(Notification::parse("locked", &json!([])).is_err());
        assert!(Notification::parse("locked", &json!([7])).is_err());
        assert!(Notification::parse("stolen", &json!(["a", "b"])).is_err());
        assert_eq!(Notification::parse("bogus", &json!([])).unwrap(), None);
    }

    #[test]
    fn test_parse_locks() {
        assert_eq!(
            Notification::parse("locked", &json!(["my_lock"])).unwrap(),
            Some(Notification::Locked(Id::new("my_lock").unwrap()))
        );
        assert_eq!(
            Notification::parse("stolen", &json!(["my_lock"])).unwrap(),
            Some(Notification::Stolen(Id::new("my_lock").unwrap()))
        );
    }

    #[test]
    fn test_noop_handler_accepts_everything() {
        let lock = Id::new("l").unwrap();
        for n in [Notification::Locked(lock.clone()), Notification::Stolen(lock)] {
            assert!(n.deliver(&NoopHandler).is_ok());
        }
    }

    #[test]
    fn test_handler_fns_dispatch() {
        let locked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&locked);
        let handler = HandlerFns::new()
            .on_locked(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_stolen(|lock| Err(anyhow::anyhow!("lost {}", lock)));

        let lock = Id::new("l").unwrap();
        Notification::Locked(lock.clone()).deliver(&handler).unwrap();
        assert_eq!(locked.load(Ordering::SeqCst), 1);
        assert!(Notification::Stolen(lock).deliver(&handler).is_err());
        assert!(Notification::Update {
            value: Value::Null,
            updates: TableUpdates::new()
        }
        .deliver(&handler)
        .is_ok());
    }
}
