//! Host callback table handed to the engine.
//!
//! A [`Capabilities`] value is built once by the host, shared through `Arc`
//! with every application and client object created from it, and invoked by
//! the engine while the host pumps. The engine side calls the `dispatch_*`
//! methods; the host and the lifecycle controller register handlers.

use std::fmt;
use std::sync::Arc;

use cef_host_protocol::{BrowserEvent, LoadEndEvent, PaintEvent, ProcessMessage, ProcessRole};
use tracing::{debug, trace};

use crate::handlers::{HandlerFn, HandlerMap, Subscription, dispatch, handler_map, insert_handler};

/// Hook that may amend a process's switches before the engine parses them.
pub type CommandLineFn = Arc<dyn Fn(&ProcessRole, &mut Vec<String>) + Send + Sync>;

/// Callbacks the engine invokes for application- and client-level events.
pub struct Capabilities {
    command_line: Option<CommandLineFn>,
    context_initialized: HandlerMap<()>,
    after_created: HandlerMap<BrowserEvent>,
    before_close: HandlerMap<BrowserEvent>,
    load_end: HandlerMap<LoadEndEvent>,
    paint: HandlerMap<PaintEvent>,
    process_message: HandlerMap<ProcessMessage>,
}

impl Capabilities {
    /// An empty callback table.
    pub fn new() -> Arc<Self> {
        CapabilitiesBuilder::default().build()
    }

    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    /// Registers a before-close handler for as long as the returned
    /// [`Subscription`] lives.
    pub fn subscribe_before_close(&self, handler: impl Fn(&BrowserEvent) + Send + Sync + 'static) -> Subscription {
        let id = insert_handler(&self.before_close, Arc::new(handler));
        Subscription::from_handler_map(id, &self.before_close)
    }

    /// Registers an after-created handler for as long as the returned
    /// [`Subscription`] lives.
    pub fn subscribe_after_created(&self, handler: impl Fn(&BrowserEvent) + Send + Sync + 'static) -> Subscription {
        let id = insert_handler(&self.after_created, Arc::new(handler));
        Subscription::from_handler_map(id, &self.after_created)
    }

    /// Lets the host amend the switches of a process about to start.
    pub fn dispatch_command_line(&self, role: &ProcessRole, switches: &mut Vec<String>) {
        if let Some(hook) = &self.command_line {
            debug!(target: "cef_host", %role, "before command line processing");
            hook(role, switches);
        }
    }

    pub fn dispatch_context_initialized(&self) {
        debug!(target: "cef_host", "context initialized");
        dispatch(&self.context_initialized, &());
    }

    pub fn dispatch_after_created(&self, browser_id: i32) {
        debug!(target: "cef_host", browser_id, "browser created");
        dispatch(&self.after_created, &BrowserEvent { browser_id });
    }

    pub fn dispatch_before_close(&self, browser_id: i32) {
        debug!(target: "cef_host", browser_id, "browser closing");
        dispatch(&self.before_close, &BrowserEvent { browser_id });
    }

    pub fn dispatch_load_end(&self, event: LoadEndEvent) {
        debug!(target: "cef_host", browser_id = event.browser_id, status = event.http_status_code, "load end");
        dispatch(&self.load_end, &event);
    }

    pub fn dispatch_paint(&self, event: PaintEvent) {
        trace!(target: "cef_host", browser_id = event.browser_id, width = event.width, height = event.height, "paint");
        dispatch(&self.paint, &event);
    }

    pub fn dispatch_process_message(&self, message: ProcessMessage) {
        debug!(target: "cef_host", browser_id = message.browser_id, name = %message.name, "process message");
        dispatch(&self.process_message, &message);
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("command_line", &self.command_line.is_some())
            .field("context_initialized", &self.context_initialized.lock().len())
            .field("after_created", &self.after_created.lock().len())
            .field("before_close", &self.before_close.lock().len())
            .field("load_end", &self.load_end.lock().len())
            .field("paint", &self.paint.lock().len())
            .field("process_message", &self.process_message.lock().len())
            .finish()
    }
}

/// Builder for [`Capabilities`]. Each `on_*` call adds one handler; handlers
/// for the same event run in the order they were added.
#[derive(Default)]
pub struct CapabilitiesBuilder {
    command_line: Option<CommandLineFn>,
    context_initialized: Vec<HandlerFn<()>>,
    after_created: Vec<HandlerFn<BrowserEvent>>,
    before_close: Vec<HandlerFn<BrowserEvent>>,
    load_end: Vec<HandlerFn<LoadEndEvent>>,
    paint: Vec<HandlerFn<PaintEvent>>,
    process_message: Vec<HandlerFn<ProcessMessage>>,
}

impl CapabilitiesBuilder {
    pub fn on_command_line(mut self, hook: impl Fn(&ProcessRole, &mut Vec<String>) + Send + Sync + 'static) -> Self {
        self.command_line = Some(Arc::new(hook));
        self
    }

    pub fn on_context_initialized(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.context_initialized.push(Arc::new(move |_: &()| handler()));
        self
    }

    pub fn on_after_created(mut self, handler: impl Fn(&BrowserEvent) + Send + Sync + 'static) -> Self {
        self.after_created.push(Arc::new(handler));
        self
    }

    pub fn on_before_close(mut self, handler: impl Fn(&BrowserEvent) + Send + Sync + 'static) -> Self {
        self.before_close.push(Arc::new(handler));
        self
    }

    pub fn on_load_end(mut self, handler: impl Fn(&LoadEndEvent) + Send + Sync + 'static) -> Self {
        self.load_end.push(Arc::new(handler));
        self
    }

    pub fn on_paint(mut self, handler: impl Fn(&PaintEvent) + Send + Sync + 'static) -> Self {
        self.paint.push(Arc::new(handler));
        self
    }

    pub fn on_process_message(mut self, handler: impl Fn(&ProcessMessage) + Send + Sync + 'static) -> Self {
        self.process_message.push(Arc::new(handler));
        self
    }

    pub fn build(self) -> Arc<Capabilities> {
        fn fill<E>(handlers: Vec<HandlerFn<E>>) -> HandlerMap<E> {
            let map = handler_map();
            for handler in handlers {
                insert_handler(&map, handler);
            }
            map
        }

        Arc::new(Capabilities {
            command_line: self.command_line,
            context_initialized: fill(self.context_initialized),
            after_created: fill(self.after_created),
            before_close: fill(self.before_close),
            load_end: fill(self.load_end),
            paint: fill(self.paint),
            process_message: fill(self.process_message),
        })
    }
}
