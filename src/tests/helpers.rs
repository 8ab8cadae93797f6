//! Shared test utilities for engine scenarios

use crate::{
    config::NavConfig,
    context::NavContext,
    event::{CompletionTag, NavEvent},
    loader::{FragmentScript, LoadRequest},
    symbol::ChildRef,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A host-driven context for `page` with an event receiver attached.
pub fn host_context(page: &str) -> (NavContext, UnboundedReceiver<NavEvent>) {
    init_logging();
    let (tx, rx) = unbounded_channel();
    (
        NavContext::new(NavConfig::for_page(page)).with_event_sender(tx),
        rx,
    )
}

pub fn drain(rx: &mut UnboundedReceiver<NavEvent>) -> Vec<NavEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn rendered_count(events: &[NavEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, NavEvent::Rendered(_)))
        .count()
}

/// Plays the host role for one request: runs `script` then reports the completion.
pub fn complete_with(ctx: &mut NavContext, request: &LoadRequest, script: &FragmentScript) {
    use crate::loader::Fragment;
    script.execute(ctx).unwrap();
    ctx.fragment_completed(&request.resolved);
}

/// The `Stdio` module fragment: one class and one method.
pub fn stdio_fragment() -> FragmentScript {
    FragmentScript::symbol(
        "Stdio",
        vec![
            ("class", vec![ChildRef::new("File", "predef/Stdio/File.html")]),
            (
                "method",
                vec![ChildRef::new("write", "predef/Stdio/write.html")],
            ),
        ],
    )
}

/// The `Stdio.Buffer` fragment, a sibling class with a method of its own.
pub fn buffer_fragment() -> FragmentScript {
    FragmentScript::symbol(
        "Stdio.Buffer",
        vec![(
            "method",
            vec![ChildRef::new("add", "predef/Stdio/Buffer.html")],
        )],
    )
}

pub fn top_level() -> Option<CompletionTag> {
    Some(CompletionTag::TopLevel)
}
