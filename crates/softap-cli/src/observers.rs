//! CLI-side `Observers` implementation. Prints lifecycle events to stdout
//! as they happen, mirroring the progress-line convention the rest of this
//! CLI's command handlers use for mutating operations.

use softap_core::{ApState, MacAddress, Observers};

pub struct StdoutObservers {
    quiet: bool,
}

impl StdoutObservers {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn emit(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

impl Observers for StdoutObservers {
    fn on_state_changed(&mut self, state: ApState) {
        self.emit(format_args!("state -> {state}"));
    }

    fn on_connected_clients_or_info_changed(&mut self) {
        self.emit("connected clients or radio info changed");
    }

    fn on_blocked_client_connecting(&mut self, mac: &MacAddress) {
        self.emit(format_args!("blocked client attempted to connect: {mac}"));
    }

    fn on_started(&mut self) {
        self.emit("soft AP started");
    }

    fn on_stopped(&mut self) {
        self.emit("soft AP stopped");
    }

    fn on_start_failure(&mut self) {
        self.emit("soft AP failed to start");
    }
}
