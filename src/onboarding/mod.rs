//! One-time persona selection flow.
//!
//! ```text
//! checking ──(stored p)──────────────────────────────▶ committed(p)  [Skip]
//!    │
//!    └─(absent)─▶ selection ──Select(p)─▶ preview(p) ──Confirm/save ok─▶ committed(p)  [Proceed]
//!                    ▲                       │  │
//!                    └─────────Back──────────┘  └─Confirm/save failed─▶ preview(p) (error returned)
//! ```

pub mod flow;
pub mod state;

pub use flow::OnboardingFlow;
pub use state::{FlowSignal, OnboardingEvent, OnboardingState};
