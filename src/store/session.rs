use crate::models::{AuthResponse, Credential, ProfilePatch, User};

use super::{AsyncState, Slice};

/// Who is signed in. `profile` is only ever set while `credential` is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub credential: Option<Credential>,
    pub profile: Option<User>,
    pub async_state: AsyncState,
}

impl Slice for SessionState {
    fn async_state(&self) -> &AsyncState {
        &self.async_state
    }

    fn async_state_mut(&mut self) -> &mut AsyncState {
        &mut self.async_state
    }
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.credential.is_some()
    }

    /// login/register fulfilled: credential and profile replaced wholesale.
    pub fn authenticated(&mut self, response: &AuthResponse) {
        self.credential = Some(response.token.clone());
        self.profile = Some(response.user.clone());
    }

    /// Back to the initial state, whatever came before.
    pub fn logout(&mut self) {
        *self = SessionState::default();
    }

    /// Profile read or written remotely: take the backend's copy.
    pub fn profile_loaded(&mut self, user: &User) {
        if self.is_signed_in() {
            self.profile = Some(user.clone());
        }
    }

    /// Local shallow merge. Returns the profile as it was before, for rollback.
    pub fn merge_profile(&mut self, patch: &ProfilePatch) -> Option<User> {
        if !self.is_signed_in() {
            return None;
        }
        let previous = self.profile.clone();
        self.profile
            .get_or_insert_with(User::default)
            .merge(patch);
        previous
    }

    pub fn restore_profile(&mut self, previous: Option<User>) {
        if self.is_signed_in() {
            self.profile = previous;
        }
    }
}
