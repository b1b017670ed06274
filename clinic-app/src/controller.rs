use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::auth::{AuthError, AuthService};
use crate::case_manager::CaseManager;
use crate::config::Config;
use crate::scheduler::{Scheduler, TaskKey};
use clinic_core::{
    ClinicGame, FallingItem, GameEvent, GameEventBus, GameEventHandler, SPAWN_INTERVAL_MS,
};
use clinic_persistence::{LeaderboardEntry, UserRepository};
use clinic_types::{GameError, GameState, GameView, PlayerAction, User};

pub const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub auto_advance: Duration,
    pub passive_income: Duration,
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            auto_advance: config.auto_advance_delay(),
            passive_income: config.passive_income_period(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Game(#[from] GameError),
}

struct Session {
    game: ClinicGame,
    bus: GameEventBus,
    rng: StdRng,
    loading_started: Instant,
}

/// Drives one player's session: runs reducers, persists progress and owns the timers.
pub struct GameController {
    session: Mutex<Session>,
    auth: AuthService,
    case_manager: Arc<CaseManager>,
    users: UserRepository,
    scheduler: Scheduler,
    settings: ControllerSettings,
}

impl GameController {
    pub fn new(
        auth: AuthService,
        case_manager: Arc<CaseManager>,
        users: UserRepository,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(Session {
                game: ClinicGame::new(),
                bus: GameEventBus::new(),
                rng: StdRng::from_entropy(),
                loading_started: Instant::now(),
            }),
            auth,
            case_manager,
            users,
            scheduler: Scheduler::new(),
            settings,
        })
    }

    pub async fn add_event_handler(&self, handler: Box<dyn GameEventHandler>) {
        self.session.lock().await.bus.add_handler(handler);
    }

    pub async fn state(&self) -> GameState {
        self.session.lock().await.game.state().clone()
    }

    pub async fn falling_items(&self) -> Vec<FallingItem> {
        self.session.lock().await.game.minigame().items().to_vec()
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.users.get_leaderboard(LEADERBOARD_SIZE).await
    }

    /// Picks up a previously stored session. Returns whether a user was signed in.
    pub async fn resume_session(self: &Arc<Self>) -> Result<bool, ControllerError> {
        match self.auth.get_current_user().await {
            Some(user) => {
                info!("Resuming session for {}", user.username);
                self.start_session(user).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn dispatch(self: &Arc<Self>, action: PlayerAction) -> Result<(), ControllerError> {
        match action {
            PlayerAction::Login { username, password } => {
                let user = self.auth.login(&username, &password).await?;
                self.start_session(user).await?;
            }
            PlayerAction::Signup { username, password } => {
                let user = self.auth.signup(&username, &password).await?;
                self.start_session(user).await?;
            }
            PlayerAction::PlayAsGuest => {
                let user = self.auth.create_guest_user();
                self.start_session(user).await?;
            }
            PlayerAction::Logout => {
                self.scheduler.cancel_all();
                self.auth.logout().await;
                self.apply(|session| Ok(session.game.sign_out())).await?;
            }
            PlayerAction::Choose { choice_id } => {
                self.apply(|session| session.game.choose(&choice_id)).await?;
            }
            PlayerAction::NextStage => {
                self.apply(|session| session.game.next_stage()).await?;
            }
            PlayerAction::LearnMore => {
                self.apply(|session| session.game.show_explanation()).await?;
                self.scheduler.cancel(TaskKey::AutoAdvance);
            }
            PlayerAction::NextCase => {
                if self.state().await.user.is_none() {
                    return Err(GameError::NotSignedIn.into());
                }
                self.load_next_case().await;
            }
            PlayerAction::UseHint => {
                self.apply(|session| session.game.use_hint(&mut session.rng))
                    .await?;
            }
            PlayerAction::BuyItem { item_id } => {
                self.apply(|session| session.game.buy_item(&item_id)).await?;
            }
            PlayerAction::OpenShop => {
                self.apply(|session| {
                    session.game.set_view(GameView::Shop);
                    Ok(Vec::new())
                })
                .await?;
            }
            PlayerAction::OpenClinic => {
                self.apply(|session| {
                    session.game.set_view(GameView::Clinic);
                    Ok(Vec::new())
                })
                .await?;
            }
            PlayerAction::CatchItem { item_id } => {
                self.apply(|session| Ok(session.game.collect_minigame_item(item_id)))
                    .await?;
            }
        }
        Ok(())
    }

    /// Clears the table, shows the loading mini-game and serves the next patient.
    pub fn load_next_case(self: &Arc<Self>) -> BoxFuture<'static, ()> {
        let controller = self.clone();
        async move {
            controller.scheduler.cancel(TaskKey::AutoAdvance);

            let xp = {
                let mut session = controller.session.lock().await;
                if session.game.state().user.is_none() {
                    return;
                }
                let events = session.game.begin_loading();
                session.bus.publish_all(&events);
                session.loading_started = Instant::now();
                session.game.state().profile.xp
            };

            controller.start_minigame();
            let manager = controller.case_manager.clone();
            let result = tokio::spawn(async move { manager.get_next_case(xp).await }).await;
            controller.scheduler.cancel(TaskKey::MinigameSpawner);

            let mut session = controller.session.lock().await;
            if session.game.state().user.is_none() {
                return;
            }
            let events = match result {
                Ok(case) => session.game.case_loaded(case),
                Err(e) => {
                    error!("Loading the next case failed: {}", e);
                    session.game.case_load_failed()
                }
            };
            session.bus.publish_all(&events);
        }
        .boxed()
    }

    pub fn shutdown(&self) {
        self.scheduler.cancel_all();
    }

    async fn start_session(self: &Arc<Self>, user: User) -> Result<(), ControllerError> {
        self.apply(|session| Ok(session.game.sign_in(user))).await?;
        self.start_passive_income();

        if self.state().await.current_case.is_none() {
            self.load_next_case().await;
        }
        Ok(())
    }

    /// Runs one reducer under the session lock, then performs its side effects.
    async fn apply<F>(self: &Arc<Self>, reducer: F) -> Result<Vec<GameEvent>, GameError>
    where
        F: FnOnce(&mut Session) -> Result<Vec<GameEvent>, GameError>,
    {
        let (events, user) = {
            let mut session = self.session.lock().await;
            let events = reducer(&mut *session)?;
            session.bus.publish_all(&events);
            (events, session.game.state().session_user())
        };

        if let Some(user) = user {
            self.after_events(&events, &user).await;
        }
        Ok(events)
    }

    async fn after_events(self: &Arc<Self>, events: &[GameEvent], user: &User) {
        for event in events {
            if let GameEvent::CaseFinished { case_id, solved } = event {
                if !user.is_guest {
                    self.case_manager.submit_result(case_id, *solved).await;
                }
                self.schedule_auto_advance();
            }
        }

        if !user.is_guest && events.contains(&GameEvent::ProfileChanged) {
            self.users.save_user(user).await;
        }
    }

    fn schedule_auto_advance(self: &Arc<Self>) {
        let controller = Arc::downgrade(self);
        self.scheduler
            .schedule_once(TaskKey::AutoAdvance, self.settings.auto_advance, async move {
                if let Some(controller) = controller.upgrade() {
                    controller.load_next_case().await;
                }
            });
    }

    fn start_passive_income(self: &Arc<Self>) {
        let controller = Arc::downgrade(self);
        self.scheduler.schedule_repeating(
            TaskKey::PassiveIncome,
            self.settings.passive_income,
            move || {
                let controller = controller.clone();
                async move {
                    if let Some(controller) = controller.upgrade() {
                        if let Err(e) = controller
                            .apply(|session| Ok(session.game.apply_passive_income()))
                            .await
                        {
                            warn!("Passive income tick failed: {}", e);
                        }
                    }
                }
            },
        );
    }

    fn start_minigame(self: &Arc<Self>) {
        let controller = Arc::downgrade(self);
        self.scheduler.schedule_repeating(
            TaskKey::MinigameSpawner,
            Duration::from_millis(SPAWN_INTERVAL_MS),
            move || {
                let controller = controller.clone();
                async move {
                    if let Some(controller) = controller.upgrade() {
                        controller.spawn_minigame_item().await;
                    }
                }
            },
        );
    }

    async fn spawn_minigame_item(&self) {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;
        let now_ms = session.loading_started.elapsed().as_millis() as u64;
        session.game.spawn_minigame_item(now_ms, &mut session.rng);
    }
}
