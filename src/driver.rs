//! Tokio event loop for one controller.

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::controller::EllipsisController;
use crate::source::TextSource;
use crate::target::RenderTarget;
use crate::viewport::ViewportSize;

/// Trigger delivered to [`drive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    Source(Option<TextSource>),
    Shown(bool),
    Visibility(bool),
    Resize(ViewportSize),
    Append(Option<String>),
    Refresh,
    /// Stop the loop and tear the controller down.
    Shutdown,
}

/// Run `controller` until [`ControllerEvent::Shutdown`] or until every sender
/// is dropped, polling it whenever one of its queues comes due.
///
/// The controller is torn down and handed back when the loop ends.
pub async fn drive<T>(
    mut controller: EllipsisController<T>,
    mut events: mpsc::Receiver<ControllerEvent>,
) -> EllipsisController<T>
where
    T: RenderTarget,
{
    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    log::debug!("event channel closed; stopping ellipsis driver");
                    break;
                };
                if !apply(&mut controller, event) {
                    break;
                }
            }
            () = sleep_until(deadline) => {
                controller.poll(Instant::now().into_std());
            }
        }
    }
    controller.teardown();
    controller
}

/// Returns `false` on shutdown.
fn apply<T: RenderTarget>(controller: &mut EllipsisController<T>, event: ControllerEvent) -> bool {
    let now = Instant::now().into_std();
    match event {
        ControllerEvent::Source(source) => controller.set_source(source, now),
        ControllerEvent::Shown(shown) => controller.set_shown(shown, now),
        ControllerEvent::Visibility(visible) => controller.set_visibility(visible, now),
        ControllerEvent::Resize(size) => controller.on_viewport_resize(size, now),
        ControllerEvent::Append(append) => controller.set_append(append),
        ControllerEvent::Refresh => controller.refresh(now),
        ControllerEvent::Shutdown => {
            log::debug!("shutdown requested; stopping ellipsis driver");
            return false;
        }
    }
    true
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
