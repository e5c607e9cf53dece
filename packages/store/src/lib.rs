//! # Store crate — client-side state for the scheduling app
//!
//! The state layer between the UI and the backend boundaries in the
//! `api` crate. The UI triggers an action on a store, the store calls
//! the backend, mutates its observable state (for collections: via a
//! full refetch after every write), and the UI re-renders from that
//! state. No action raises past its store; failures land in observable
//! error fields or [`Outcome`] envelopes, and are also written to the
//! `tracing` log.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | Login/logout/sign-up/reset over the identity provider |
//! | [`user`] | Current user's profile row and derived role flags |
//! | [`cadastro`] | Specialties/professionals/profiles/clients collections |
//! | [`week`] | Sunday-to-Saturday week navigation for the calendar |
//! | [`notify`] | Severity/toast mapping and domain message templates |
//! | [`validate`] | CPF/telefone normalization helpers |
//! | [`state`] | [`AppState`]: one explicit container per app session |

pub mod cadastro;
pub mod notify;
pub mod session;
pub mod state;
pub mod user;
pub mod validate;
pub mod week;

pub use cadastro::{CadastroStore, Outcome};
pub use notify::{Notifications, Notifier, Severity, Toast};
pub use session::{AuthError, Navigator, Route, SessionService};
pub use state::AppState;
pub use user::UserStore;
pub use week::{start_of_week, week_days, WeekNavigator};
