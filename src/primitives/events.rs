//! Event bindings - user interaction drives the change bus.
//!
//! An event binding registers a listener on the bound node. When the event
//! arrives the listener runs the handler, then fires the session notifier so
//! every dynamic binding re-evaluates against the new state.
//!
//! # Async handlers
//!
//! `on_click_async` / `on_key_up_async` take handlers returning a future.
//! The future is polled once on the spot, so its body runs up to the first
//! pending `.await` before anything else. The notifier then fires twice:
//! 1. right after that first poll (shows the "pending" state)
//! 2. when the future completes (shows the "settled" state)
//!
//! The rest of the future runs on the session scheduler, so the second fire
//! always happens on a later pump, even for a future that is ready
//! immediately.

use std::future::Future;
use std::rc::Rc;
use std::task::Context;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use tracing::trace;

use super::types::{AnyAttribute, Attribute};
use crate::engine::Document;
use crate::pipeline::Session;
use crate::types::{
    BoolProp, Caps, Event, EventKind, FocusEvent, KeyboardEvent, MouseEvent, NodeId, StringProp,
};

// =============================================================================
// Callback Types
// =============================================================================

/// Synchronous event callback. Receives the document the event came from.
pub type EventCallback = Rc<dyn Fn(&Document, &Event)>;

/// Asynchronous event callback.
pub type AsyncEventCallback = Rc<dyn Fn(&Event) -> LocalBoxFuture<'static, ()>>;

// =============================================================================
// Bindings
// =============================================================================

/// Runs a handler for one event kind, then fires the notifier.
pub struct EventBinding {
    kind: EventKind,
    required: Caps,
    handler: EventCallback,
}

impl EventBinding {
    pub fn new(kind: EventKind, handler: impl Fn(&Document, &Event) + 'static) -> Self {
        Self {
            kind,
            required: Caps::empty(),
            handler: Rc::new(handler),
        }
    }

    /// Only attach to nodes carrying `caps`.
    pub fn requiring(mut self, caps: Caps) -> Self {
        self.required = caps;
        self
    }
}

impl Attribute for EventBinding {
    fn set(&self, node: NodeId, session: &Session) {
        let document = session.document();
        if !document.caps(node).contains(self.required) {
            trace!(?node, event = self.kind.name(), "event binding skipped, node kind lacks support");
            return;
        }

        let handler = self.handler.clone();
        let notifier = session.notifier().clone();
        document.add_event_listener(node, self.kind, move |document, event| {
            handler(document, event);
            notifier.fire();
        });
    }
}

/// Runs an async handler; fires once when it starts and once when it settles.
pub struct AsyncEventBinding {
    kind: EventKind,
    handler: AsyncEventCallback,
}

impl Attribute for AsyncEventBinding {
    fn set(&self, node: NodeId, session: &Session) {
        let handler = self.handler.clone();
        let notifier = session.notifier().clone();
        let scheduler = session.scheduler().clone();

        session
            .document()
            .add_event_listener(node, self.kind, move |_, event| {
                let mut pending = handler(event);
                let settled = pending
                    .poll_unpin(&mut Context::from_waker(noop_waker_ref()))
                    .is_ready();
                notifier.fire();

                let notifier = notifier.clone();
                if settled {
                    scheduler.spawn(async move { notifier.fire() });
                } else {
                    scheduler.spawn(async move {
                        pending.await;
                        notifier.fire();
                    });
                }
            });
    }
}

// =============================================================================
// Factories
// =============================================================================

pub fn on_click(handler: impl Fn(&MouseEvent) + 'static) -> AnyAttribute {
    Box::new(EventBinding::new(EventKind::Click, move |_, event| {
        if let Event::Click(mouse) = event {
            handler(mouse);
        }
    }))
}

pub fn on_double_click(handler: impl Fn(&MouseEvent) + 'static) -> AnyAttribute {
    Box::new(EventBinding::new(EventKind::DoubleClick, move |_, event| {
        if let Event::DoubleClick(mouse) = event {
            handler(mouse);
        }
    }))
}

pub fn on_blur(handler: impl Fn(&FocusEvent) + 'static) -> AnyAttribute {
    Box::new(EventBinding::new(EventKind::Blur, move |_, event| {
        if let Event::Blur(focus) = event {
            handler(focus);
        }
    }))
}

pub fn on_key_up(handler: impl Fn(&KeyboardEvent) + 'static) -> AnyAttribute {
    Box::new(EventBinding::new(EventKind::KeyUp, move |_, event| {
        if let Event::KeyUp(key) = event {
            handler(key);
        }
    }))
}

pub fn on_key_down(handler: impl Fn(&KeyboardEvent) + 'static) -> AnyAttribute {
    Box::new(EventBinding::new(EventKind::KeyDown, move |_, event| {
        if let Event::KeyDown(key) = event {
            handler(key);
        }
    }))
}

/// Text inputs only: receives the input's value after every key-up.
pub fn on_text_changed(handler: impl Fn(&str) + 'static) -> AnyAttribute {
    let binding = EventBinding::new(EventKind::KeyUp, move |document, event| {
        let text = document
            .string(event.target(), StringProp::Value)
            .unwrap_or_default();
        handler(&text);
    });
    Box::new(binding.requiring(Caps::TEXT_INPUT))
}

/// Checkable inputs only: receives the checked state after every click.
pub fn on_check_changed(handler: impl Fn(bool) + 'static) -> AnyAttribute {
    let binding = EventBinding::new(EventKind::Click, move |document, event| {
        handler(document.flag(event.target(), BoolProp::Checked));
    });
    Box::new(binding.requiring(Caps::CHECK))
}

pub fn on_click_async<F, Fut>(handler: F) -> AnyAttribute
where
    F: Fn(&MouseEvent) -> Fut + 'static,
    Fut: Future + 'static,
{
    Box::new(AsyncEventBinding {
        kind: EventKind::Click,
        handler: Rc::new(move |event| match event {
            Event::Click(mouse) => handler(mouse).map(drop).boxed_local(),
            _ => async {}.boxed_local(),
        }),
    })
}

pub fn on_key_up_async<F, Fut>(handler: F) -> AnyAttribute
where
    F: Fn(&KeyboardEvent) -> Fut + 'static,
    Fut: Future + 'static,
{
    Box::new(AsyncEventBinding {
        kind: EventKind::KeyUp,
        handler: Rc::new(move |event| match event {
            Event::KeyUp(key) => handler(key).map(drop).boxed_local(),
            _ => async {}.boxed_local(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{button, check_box, computed, disabled, div, text, text_box};
    use crate::types::{ENTER_KEY, InputType, NodeKind};
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_click_runs_handler_then_fires() {
        let session = Session::new();
        let doc = session.document();
        let clicks = Rc::new(Cell::new(0));

        let counter = clicks.clone();
        let label_source = clicks.clone();
        let view = div(
            vec![],
            vec![
                button(vec![on_click(move |_| counter.set(counter.get() + 1))], vec![]),
                div(vec![text(computed(move || format!("{} clicks", label_source.get())))], vec![]),
            ],
        );
        let root = view.render_into(doc.body(), &session);
        let children = doc.children(root);

        doc.click(children[0]);
        assert_eq!(clicks.get(), 1);
        assert_eq!(session.notifier().fire_count(), 1);
        assert_eq!(doc.text_content(children[1]), "1 clicks");
    }

    #[test]
    fn test_keyboard_handlers_receive_key_code() {
        let session = Session::new();
        let doc = session.document();
        let last_up = Rc::new(Cell::new(0));
        let last_down = Rc::new(Cell::new(0));

        let up = last_up.clone();
        let down = last_down.clone();
        let node = text_box(vec![
            on_key_up(move |key| up.set(key.key_code)),
            on_key_down(move |key| down.set(key.key_code)),
        ])
        .render_into(doc.body(), &session);

        doc.key_down(node, ENTER_KEY);
        doc.key_up(node, 65);
        assert_eq!(last_down.get(), ENTER_KEY);
        assert_eq!(last_up.get(), 65);
        assert_eq!(session.notifier().fire_count(), 2);
    }

    #[test]
    fn test_text_changed_reports_value() {
        let session = Session::new();
        let doc = session.document();
        let seen = Rc::new(RefCell::new(String::new()));

        let sink = seen.clone();
        let node = text_box(vec![on_text_changed(move |text| *sink.borrow_mut() = text.to_owned())])
            .render_into(doc.body(), &session);

        doc.input_text(node, "milk");
        assert_eq!(*seen.borrow(), "milk");
    }

    #[test]
    fn test_text_changed_ignores_non_text_nodes() {
        let session = Session::new();
        let doc = session.document();
        let node = div(vec![on_text_changed(|_| panic!("must not run"))], vec![])
            .render_into(doc.body(), &session);

        assert_eq!(doc.listener_count(node, EventKind::KeyUp), 0);
        doc.key_up(node, 65);
        assert_eq!(session.notifier().fire_count(), 0);
    }

    #[test]
    fn test_check_changed_reports_state() {
        let session = Session::new();
        let doc = session.document();
        let states = Rc::new(RefCell::new(Vec::new()));

        let sink = states.clone();
        let node = check_box(vec![on_check_changed(move |on| sink.borrow_mut().push(on))])
            .render_into(doc.body(), &session);

        doc.toggle_checked(node);
        doc.toggle_checked(node);
        assert_eq!(*states.borrow(), vec![true, false]);

        let plain = doc.create_element(NodeKind::Button);
        on_check_changed(|_| {}).set(plain, &session);
        assert_eq!(doc.listener_count(plain, EventKind::Click), 0);
    }

    #[test]
    fn test_double_click_and_blur() {
        let session = Session::new();
        let doc = session.document();
        let editing = Rc::new(Cell::new(false));

        let start = editing.clone();
        let stop = editing.clone();
        let node = doc.create_element(NodeKind::Input(InputType::Text));
        on_double_click(move |_| start.set(true)).set(node, &session);
        on_blur(move |_| stop.set(false)).set(node, &session);

        doc.double_click(node);
        assert!(editing.get());
        doc.focus(node);
        doc.blur(node);
        assert!(!editing.get());
        assert_eq!(session.notifier().fire_count(), 2);
    }

    #[test]
    fn test_async_click_fires_twice() {
        let session = Session::new();
        let doc = session.document();
        let node = button(vec![on_click_async(|_| async { 42 })], vec![]).render_into(doc.body(), &session);

        doc.click(node);
        assert_eq!(session.notifier().fire_count(), 1, "pending fire is immediate");

        session.scheduler().run_until_stalled();
        assert_eq!(session.notifier().fire_count(), 2, "settled fire after completion");
    }

    #[test]
    fn test_async_key_up_settles_after_delay() {
        let session = Session::new();
        let doc = session.document();
        let scheduler = session.scheduler().clone();
        let sending = Rc::new(Cell::new(false));

        let flag = sending.clone();
        let node = text_box(vec![on_key_up_async(move |_| {
            flag.set(true);
            let flag = flag.clone();
            let wait = scheduler.delay(500);
            async move {
                wait.await;
                flag.set(false);
            }
        })])
        .render_into(doc.body(), &session);

        doc.key_up(node, ENTER_KEY);
        session.scheduler().run_until_stalled();
        assert!(sending.get());
        assert_eq!(session.notifier().fire_count(), 1);

        session.scheduler().advance(500);
        assert!(!sending.get());
        assert_eq!(session.notifier().fire_count(), 2);
    }

    #[test]
    fn test_async_body_runs_before_pending_fire() {
        let session = Session::new();
        let doc = session.document();
        let scheduler = session.scheduler().clone();
        let sending = Rc::new(Cell::new(false));

        let flag = sending.clone();
        let state = sending.clone();
        let node = button(
            vec![
                on_click_async(move |_| {
                    let flag = flag.clone();
                    let scheduler = scheduler.clone();
                    async move {
                        flag.set(true);
                        scheduler.delay(100).await;
                        flag.set(false);
                    }
                }),
                disabled(computed(move || state.get())),
            ],
            vec![],
        )
        .render_into(doc.body(), &session);

        doc.click(node);
        assert!(sending.get());
        assert!(doc.flag(node, BoolProp::Disabled), "pending state written by the first fire");
        assert_eq!(session.notifier().fire_count(), 1);

        session.scheduler().run_until_stalled();
        assert!(doc.flag(node, BoolProp::Disabled));

        session.scheduler().advance(100);
        assert!(!doc.flag(node, BoolProp::Disabled));
        assert_eq!(session.notifier().fire_count(), 2);
    }

    #[test]
    fn test_async_ready_body_still_fires_twice() {
        let session = Session::new();
        let doc = session.document();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let node = button(
            vec![on_click_async(move |_| {
                let counter = counter.clone();
                async move { counter.set(counter.get() + 1) }
            })],
            vec![],
        )
        .render_into(doc.body(), &session);

        doc.click(node);
        assert_eq!(hits.get(), 1, "body ran during the click");
        assert_eq!(session.notifier().fire_count(), 1);

        session.scheduler().run_until_stalled();
        assert_eq!(hits.get(), 1, "body is not run a second time");
        assert_eq!(session.notifier().fire_count(), 2);
    }

    #[test]
    fn test_async_settles_after_node_released() {
        let session = Session::new();
        let doc = session.document();
        let node = button(vec![on_click_async(|_| async {})], vec![]).render_into(doc.body(), &session);

        doc.click(node);
        doc.release(node);
        session.scheduler().run_until_stalled();
        assert_eq!(session.notifier().fire_count(), 2);
    }
}
