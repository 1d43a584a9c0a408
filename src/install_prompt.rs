use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    /// Nothing has offered installation yet
    Absent,
    /// An offer is waiting for the user
    Pending,
    /// The offer was answered and cannot be reused
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Accepted,
    Dismissed,
}

/// The "install this app" offer shown once offline assets are ready.
#[derive(Debug)]
pub struct InstallPrompt {
    state: PromptState,
    banner_visible: bool,
}

impl Default for InstallPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallPrompt {
    pub fn new() -> Self {
        Self {
            state: PromptState::Absent,
            banner_visible: false,
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    /// Defer an offer until the user acts on the banner.
    pub fn offer(&mut self) {
        if self.state == PromptState::Absent {
            self.state = PromptState::Pending;
            self.banner_visible = true;
        }
    }

    /// Record the user's answer. Returns the choice, or `None` when there was
    /// no pending offer to answer.
    pub fn answer(&mut self, choice: PromptChoice) -> Option<PromptChoice> {
        if self.state != PromptState::Pending {
            return None;
        }

        self.state = PromptState::Consumed;
        if choice == PromptChoice::Accepted {
            self.banner_visible = false;
        }
        info!(?choice, "install prompt answered");
        Some(choice)
    }

    pub fn dismiss(&mut self) {
        self.banner_visible = false;
    }
}
