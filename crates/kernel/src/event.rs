use std::collections::BTreeMap;

/// A subscriber callback. It receives the mutable context the hub is
/// triggered with, followed by the event arguments.
pub type Handler<C, A> = Box<dyn FnMut(&mut C, &A)>;

/// Named publish/subscribe hub.
///
/// Handlers are grouped by event name and invoked synchronously in the order
/// they were registered. Instead of capturing shared mutable state, handlers
/// are handed the context the owner passes to [`EventHub::trigger`], so a
/// component can notify its owner without holding a reference back to it.
pub struct EventHub<C, A> {
    handlers: BTreeMap<String, Vec<Handler<C, A>>>,
}

impl<C, A> EventHub<C, A> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Append a handler under `name`.
    pub fn on<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&mut C, &A) + 'static,
    {
        self.handlers
            .entry(name.into())
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Remove every handler registered under `name`. Returns how many were removed.
    pub fn off(&mut self, name: &str) -> usize {
        self.handlers.remove(name).map_or(0, |list| list.len())
    }

    /// Invoke all handlers for `name` in registration order.
    ///
    /// Returns the number of handlers invoked; zero when nothing listens.
    pub fn trigger(&mut self, name: &str, ctx: &mut C, args: &A) -> usize {
        let Some(list) = self.handlers.get_mut(name) else {
            tracing::trace!(event = name, "trigger with no handlers");
            return 0;
        };
        for handler in list.iter_mut() {
            handler(ctx, args);
        }
        list.len()
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C, A> Default for EventHub<C, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, A> std::fmt::Debug for EventHub<C, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(name, list)| (name, list.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_without_handlers_is_noop() {
        let mut hub: EventHub<Vec<i32>, i32> = EventHub::new();
        let mut log = Vec::new();
        assert_eq!(hub.trigger("tick", &mut log, &1), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let mut hub: EventHub<Vec<String>, i32> = EventHub::new();
        hub.on("tick", |log, n| log.push(format!("first {n}")))
            .on("tick", |log, n| log.push(format!("second {n}")))
            .on("tick", |log, n| log.push(format!("third {n}")));

        let mut log = Vec::new();
        assert_eq!(hub.trigger("tick", &mut log, &7), 3);
        assert_eq!(log, vec!["first 7", "second 7", "third 7"]);
    }

    #[test]
    fn names_are_independent() {
        let mut hub: EventHub<Vec<&'static str>, ()> = EventHub::new();
        hub.on("tick", |log, _| log.push("tick"));
        hub.on("resize", |log, _| log.push("resize"));

        let mut log = Vec::new();
        hub.trigger("resize", &mut log, &());
        assert_eq!(log, vec!["resize"]);
    }

    #[test]
    fn off_removes_all_handlers_for_name() {
        let mut hub: EventHub<u32, ()> = EventHub::new();
        hub.on("tick", |count, _| *count += 1);
        hub.on("tick", |count, _| *count += 1);
        hub.on("resize", |count, _| *count += 100);

        assert_eq!(hub.off("tick"), 2);
        assert_eq!(hub.handler_count("tick"), 0);

        let mut count = 0;
        assert_eq!(hub.trigger("tick", &mut count, &()), 0);
        assert_eq!(count, 0);

        hub.trigger("resize", &mut count, &());
        assert_eq!(count, 100);
        assert_eq!(hub.off("missing"), 0);
    }

    #[test]
    fn handlers_keep_their_own_state() {
        let mut hub: EventHub<Vec<u32>, ()> = EventHub::new();
        let mut calls = 0;
        hub.on("tick", move |log, _| {
            calls += 1;
            log.push(calls);
        });

        let mut log = Vec::new();
        hub.trigger("tick", &mut log, &());
        hub.trigger("tick", &mut log, &());
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn debug_lists_names_and_counts() {
        let mut hub: EventHub<(), ()> = EventHub::new();
        assert!(hub.is_empty());
        hub.on("ready", |_, _| {});
        assert_eq!(format!("{hub:?}"), r#"{"ready": 1}"#);
    }
}
