use std::{future::Future, sync::Arc};

use tracing::{debug, error, info};

use crate::{
    AppError, AppResult, ClientConfig,
    api::{ApiClient, ApiError},
    dispatch::{Action, ActionKey, DispatchError, Dispatcher},
    models::{AuthResponse, Candidate, Credential, LinkResponse, MatchSummary, Message, ProfilePatch, StatusPayload, User},
    nfc::{NfcDriver, NfcService},
    store::{MatchState, SessionState, Store},
};

/// Everything the screens talk to. Built once at startup and handed around by
/// reference; the stores inside are cheap to clone for subscribers.
pub struct LinkApp {
    api: ApiClient,
    session: Store<SessionState>,
    matching: Store<MatchState>,
    dispatcher: Dispatcher,
    nfc: NfcService,
}

async fn authorized<T, F, Fut>(api: ApiClient, credential: Option<Credential>, call: F) -> Result<T, ApiError>
where
    F: FnOnce(ApiClient, Credential) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let credential = credential.ok_or(ApiError::MissingCredential)?;
    call(api, credential).await
}

impl LinkApp {
    pub fn new(config: &ClientConfig, nfc_driver: Arc<dyn NfcDriver>) -> AppResult<LinkApp> {
        Ok(LinkApp {
            api: ApiClient::new(config)?,
            session: Store::default(),
            matching: Store::default(),
            dispatcher: Dispatcher::new(),
            nfc: NfcService::new(nfc_driver),
        })
    }

    pub fn from_env(nfc_driver: Arc<dyn NfcDriver>) -> AppResult<LinkApp> {
        LinkApp::new(&ClientConfig::from_env()?, nfc_driver)
    }

    pub fn session(&self) -> &Store<SessionState> {
        &self.session
    }

    pub fn matching(&self) -> &Store<MatchState> {
        &self.matching
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn nfc(&self) -> &NfcService {
        &self.nfc
    }

    fn credential(&self) -> Option<Credential> {
        self.session.read(|session| session.credential.clone())
    }

    pub fn login(&self, email: &str, password: &str) -> Action<AuthResponse> {
        let api = self.api.clone();
        let (email, password) = (email.to_owned(), password.to_owned());
        self.dispatcher.dispatch(
            &self.session,
            ActionKey::Authenticate,
            async move { api.login(&email, &password).await },
            |session, response: &AuthResponse| {
                session.authenticated(response);
                info!(username = %response.user.username, "signed in");
            },
        )
    }

    pub fn register(&self, username: &str, email: &str, password: &str) -> Action<AuthResponse> {
        let api = self.api.clone();
        let (username, email, password) = (username.to_owned(), email.to_owned(), password.to_owned());
        self.dispatcher.dispatch(
            &self.session,
            ActionKey::Authenticate,
            async move { api.register(&username, &email, &password).await },
            |session, response: &AuthResponse| {
                session.authenticated(response);
                info!(username = %response.user.username, "registered");
            },
        )
    }

    /// Synchronous and unconditional. Session actions still in flight are
    /// dropped when they land.
    pub fn logout(&self) {
        self.dispatcher.invalidate(&ActionKey::Authenticate);
        self.dispatcher.invalidate(&ActionKey::Profile);
        self.session.update(SessionState::logout);
        info!("signed out");
    }

    pub fn refresh_profile(&self) -> Action<User> {
        self.dispatcher.dispatch(
            &self.session,
            ActionKey::Profile,
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.get_profile(&token).await
            }),
            SessionState::profile_loaded,
        )
    }

    /// Local merge only; nothing is sent. Prefer [`LinkApp::update_profile`].
    pub fn merge_profile(&self, patch: &ProfilePatch) {
        self.session.update(|session| {
            session.merge_profile(patch);
        });
    }

    /// Applies `patch` right away, then replaces it with the backend's copy,
    /// or puts the old profile back if the write fails or is cancelled.
    pub fn update_profile(&self, patch: ProfilePatch) -> Action<User> {
        let optimistic = patch.clone();
        self.dispatcher.dispatch_optimistic(
            &self.session,
            ActionKey::Profile,
            move |session| session.merge_profile(&optimistic),
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.update_profile(&token, &patch).await
            }),
            SessionState::profile_loaded,
            SessionState::restore_profile,
        )
    }

    pub fn fetch_matches(&self) -> Action<Vec<MatchSummary>> {
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::Matches,
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.get_matches(&token).await
            }),
            |matching, matches: &Vec<MatchSummary>| matching.matches_loaded(matches),
        )
    }

    pub fn start_searching(&self) -> Action<StatusPayload> {
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::Searching,
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.start_searching(&token).await
            }),
            |matching, _: &StatusPayload| matching.searching_started(),
        )
    }

    pub fn stop_searching(&self) -> Action<StatusPayload> {
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::Searching,
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.stop_searching(&token).await
            }),
            |matching, _: &StatusPayload| matching.searching_stopped(),
        )
    }

    pub fn find_match(&self) -> Action<Option<Candidate>> {
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::FindMatch,
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.find_match(&token).await
            }),
            |matching, candidate: &Option<Candidate>| matching.candidate_found(candidate.as_ref()),
        )
    }

    pub fn respond_to_link(&self, link_id: &str, accept: bool) -> Action<LinkResponse> {
        let link = link_id.to_owned();
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::RespondToLink(link_id.to_owned()),
            authorized(self.api.clone(), self.credential(), move |api, token| async move {
                api.respond_to_link(&token, &link, accept).await
            }),
            MatchState::link_resolved,
        )
    }

    /// Refused locally for a room we know is locked, or for blank content.
    pub fn send_message(&self, chatroom_id: &str, content: &str) -> Action<Message> {
        if content.trim().is_empty() {
            return Action::ready(Err(DispatchError::Blocked("message is empty".to_owned())));
        }
        if !self.matching.read(|matching| matching.can_compose(chatroom_id)) {
            return Action::ready(Err(DispatchError::Blocked(format!("chatroom {chatroom_id} is locked"))));
        }

        let (recipient, content) = (chatroom_id.to_owned(), content.to_owned());
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::send_message(),
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.send_message(&token, &recipient, &content).await
            }),
            |matching, message: &Message| {
                if !matching.message_sent(message) {
                    debug!(message_id = %message.id, chatroom_id = ?message.chatroom_id, "no such chatroom, message dropped");
                }
            },
        )
    }

    pub fn unlock_chatroom(&self, chatroom_id: &str) -> Action<StatusPayload> {
        let (room, requested) = (chatroom_id.to_owned(), chatroom_id.to_owned());
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::Unlock(chatroom_id.to_owned()),
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.unlock_chatroom(&token, &room).await
            }),
            move |matching, payload: &StatusPayload| {
                matching.chatroom_unlocked(payload, &requested);
            },
        )
    }

    pub fn verify_nfc_and_unlock_chatroom(&self, chatroom_id: &str) -> Action<StatusPayload> {
        let (room, requested) = (chatroom_id.to_owned(), chatroom_id.to_owned());
        self.dispatcher.dispatch(
            &self.matching,
            ActionKey::Unlock(chatroom_id.to_owned()),
            authorized(self.api.clone(), self.credential(), |api, token| async move {
                api.verify_nfc_and_unlock_chatroom(&token, &room).await
            }),
            move |matching, payload: &StatusPayload| {
                matching.chatroom_unlocked(payload, &requested);
            },
        )
    }

    /// Starts NFC, waits for a tag, then asks the backend to unlock the room.
    /// The tag itself is not sent. Failures are logged and returned, never
    /// retried.
    pub async fn unlock_with_nfc(&self, chatroom_id: &str) -> AppResult<StatusPayload> {
        let result = async {
            self.nfc.init().await?;
            let tag_id = self.nfc.read().await?;
            debug!(chatroom_id, tag_present = !tag_id.is_empty(), "nfc tag read");

            Ok::<_, AppError>(self.verify_nfc_and_unlock_chatroom(chatroom_id).await?)
        }
        .await;

        if let Err(e) = &result {
            error!(chatroom_id, error = %e, "unlocking chatroom");
        }
        result
    }
}
