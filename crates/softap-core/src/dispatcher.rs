// ── Dispatcher ──
//
// Delivers events one at a time from a FIFO mailbox to the currently
// active state. One tokio task owns the `Receiver` half and feeds events to
// the `StateMachine` sequentially — nothing else ever calls
// `StateMachine::dispatch` — which is what makes the single-threaded
// cooperative model hold without a mutex: a tight
// `while let Some(cmd) = rx.recv().await` loop draining an `mpsc` channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::Event;
use crate::state::{DispatchOutcome, StateMachine};

pub struct Dispatcher;

impl Dispatcher {
    /// Spawn the dispatcher loop. Returns once the mailbox closes or the
    /// state machine reaches its terminal quit.
    pub fn spawn(mut state_machine: StateMachine, mut mailbox: mpsc::UnboundedReceiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = mailbox.recv().await {
                if state_machine.dispatch(event) == DispatchOutcome::Quit {
                    debug!("dispatcher quitting");
                    break;
                }
            }
            mailbox.close();
        })
    }
}
