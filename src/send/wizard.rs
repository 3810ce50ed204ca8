//! Send-money wizard
//!
//! Four linear steps: recipient, amount, payment method, review. Each forward move is
//! gated by the current step's check; going back is always allowed except from the
//! first step. The controller only mutates its own state; payment I/O belongs to the
//! dispatcher, which receives a `PaymentOrder` built at the review step.

use serde::Serialize;

use crate::models::assets::{find_asset, AssetDescriptor};
use crate::models::errors::PaymentError;
use crate::models::rail::{Rail, RecipientKind};
use crate::send::fee::{FeeQuote, FeeSchedule};
use crate::send::recipient::{resolve_candidates, RecipientCandidate};
use crate::send::request::MoneyRequest;

pub const QUICK_AMOUNTS: [u32; 4] = [10, 25, 50, 100];
pub const MIN_USERNAME_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Recipient = 1,
    Amount = 2,
    Payment = 3,
    Review = 4,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Recipient => "Recipient",
            WizardStep::Amount => "Amount",
            WizardStep::Payment => "Payment",
            WizardStep::Review => "Review",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            WizardStep::Recipient => Some(WizardStep::Amount),
            WizardStep::Amount => Some(WizardStep::Payment),
            WizardStep::Payment => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    fn prev(&self) -> Option<Self> {
        match self {
            WizardStep::Recipient => None,
            WizardStep::Amount => Some(WizardStep::Recipient),
            WizardStep::Payment => Some(WizardStep::Amount),
            WizardStep::Review => Some(WizardStep::Payment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub step: WizardStep,
    pub recipient_kind: RecipientKind,
    pub handle: String,
    /// As typed
    pub amount: String,
    pub rail: Option<Rail>,
    pub selected_asset_id: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Recipient,
            recipient_kind: RecipientKind::Internal,
            handle: String::new(),
            amount: String::new(),
            rail: None,
            selected_asset_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub kind: RecipientKind,
    pub handle: String,
}

impl Recipient {
    /// `@username` for PyLink users, the email for PayPal accounts
    pub fn display(&self) -> String {
        match self.kind {
            RecipientKind::Internal => format!("@{}", self.handle),
            RecipientKind::External => self.handle.clone(),
        }
    }
}

/// Everything the dispatcher needs, frozen at the review step
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    pub recipient: Recipient,
    pub quote: FeeQuote,
    pub rail: Rail,
    pub asset: Option<&'static AssetDescriptor>,
}

pub struct WizardController {
    state: WizardState,
    fees: FeeSchedule,
    rail_options: Vec<Rail>,
    wallet_connected: bool,
}

impl WizardController {
    pub fn new() -> Self {
        Self::with_fees(FeeSchedule::default())
    }

    pub fn with_fees(fees: FeeSchedule) -> Self {
        Self {
            state: WizardState::default(),
            fees,
            rail_options: Rail::ALL.to_vec(),
            wallet_connected: false,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    // ===== Step 1: recipient =====

    pub fn set_recipient_kind(&mut self, kind: RecipientKind) {
        self.state.recipient_kind = kind;
    }

    /// Usernames are stored without `@`
    pub fn set_handle(&mut self, handle: &str) {
        self.state.handle = match self.state.recipient_kind {
            RecipientKind::Internal => handle.replace('@', ""),
            RecipientKind::External => handle.to_string(),
        };
    }

    /// Suggestions for the username field; none for PayPal emails
    pub fn candidates(&self) -> Vec<RecipientCandidate> {
        match self.state.recipient_kind {
            RecipientKind::Internal => resolve_candidates(&self.state.handle),
            RecipientKind::External => Vec::new(),
        }
    }

    pub fn choose_candidate(&mut self, candidate: &RecipientCandidate) {
        self.set_handle(&candidate.handle);
    }

    pub fn recipient(&self) -> Recipient {
        Recipient {
            kind: self.state.recipient_kind,
            handle: self.state.handle.clone(),
        }
    }

    // ===== Step 2: amount =====

    pub fn set_amount(&mut self, amount: &str) {
        self.state.amount = amount.to_string();
    }

    /// One of the preset buttons; anything else is refused
    pub fn set_quick_amount(&mut self, amount: u32) -> Result<(), PaymentError> {
        if !QUICK_AMOUNTS.contains(&amount) {
            return Err(PaymentError::InvalidAmount(amount.to_string()));
        }
        self.state.amount = amount.to_string();
        Ok(())
    }

    /// Recomputed on every call, never cached
    pub fn quote(&self) -> FeeQuote {
        self.fees.quote(&self.state.amount, self.state.recipient_kind)
    }

    // ===== Step 3: payment method =====

    /// Rails the dispatcher found usable; a selected rail that disappears is cleared
    pub fn set_rail_options(&mut self, rails: Vec<Rail>) {
        if let Some(rail) = self.state.rail {
            if !rails.contains(&rail) {
                self.state.rail = None;
            }
        }
        self.rail_options = rails;
    }

    pub fn rail_options(&self) -> &[Rail] {
        &self.rail_options
    }

    pub fn select_rail(&mut self, rail: Rail) -> Result<(), PaymentError> {
        if !self.rail_options.contains(&rail) {
            return Err(PaymentError::RailNotOffered(rail));
        }
        self.state.rail = Some(rail);
        Ok(())
    }

    pub fn set_wallet_connected(&mut self, connected: bool) {
        self.wallet_connected = connected;
    }

    pub fn select_asset(&mut self, id: &str) -> Result<&'static AssetDescriptor, PaymentError> {
        let asset = find_asset(id).ok_or_else(|| PaymentError::UnknownAsset(id.to_string()))?;
        self.state.selected_asset_id = Some(asset.symbol.to_string());
        Ok(asset)
    }

    pub fn selected_asset(&self) -> Option<&'static AssetDescriptor> {
        self.state.selected_asset_id.as_deref().and_then(find_asset)
    }

    // ===== Navigation =====

    pub fn can_advance(&self) -> bool {
        self.check_step(self.state.step).is_ok()
    }

    /// Move forward if the current step checks out; a no-op otherwise
    pub fn advance(&mut self) -> WizardStep {
        match self.check_step(self.state.step) {
            Ok(()) => {
                if let Some(next) = self.state.step.next() {
                    crate::wizard_debug!("step {} -> {}", self.state.step.number(), next.number());
                    self.state.step = next;
                }
            }
            Err(e) => crate::wizard_debug!("advance blocked: {}", e),
        }
        self.state.step
    }

    /// Move back one step; a no-op on the first step
    pub fn retreat(&mut self) -> WizardStep {
        if let Some(prev) = self.state.step.prev() {
            self.state.step = prev;
        }
        self.state.step
    }

    fn check_step(&self, step: WizardStep) -> Result<(), PaymentError> {
        let incomplete = PaymentError::StepIncomplete { step: step.number() };
        match step {
            WizardStep::Recipient => {
                let handle = &self.state.handle;
                let ok = match self.state.recipient_kind {
                    RecipientKind::Internal => handle.chars().count() >= MIN_USERNAME_LEN,
                    RecipientKind::External => handle.contains('@'),
                };
                if ok {
                    Ok(())
                } else {
                    Err(incomplete)
                }
            }
            // a zero quote covers empty, malformed, non-positive and out-of-range input
            WizardStep::Amount => {
                if self.quote().is_zero() {
                    Err(PaymentError::InvalidAmount(self.state.amount.clone()))
                } else {
                    Ok(())
                }
            }
            WizardStep::Payment => match self.state.rail {
                None => Err(PaymentError::RailNotSelected),
                Some(Rail::Wallet) if self.wallet_connected && self.selected_asset().is_none() => {
                    Err(PaymentError::AssetRequired)
                }
                Some(_) => Ok(()),
            },
            WizardStep::Review => Ok(()),
        }
    }

    /// Freeze the transfer for the dispatcher; only at the review step
    pub fn review(&self) -> Result<PaymentOrder, PaymentError> {
        if self.state.step != WizardStep::Review {
            return Err(PaymentError::StepIncomplete {
                step: self.state.step.number(),
            });
        }
        let rail = self.state.rail.ok_or(PaymentError::RailNotSelected)?;
        Ok(PaymentOrder {
            recipient: self.recipient(),
            quote: self.quote(),
            rail,
            asset: self.selected_asset(),
        })
    }

    /// Start a transfer from a scanned request code: recipient and amount filled in,
    /// back on the first step
    pub fn prefill(&mut self, request: &MoneyRequest) {
        self.reset();
        self.state.recipient_kind = RecipientKind::Internal;
        self.state.handle = request.handle.clone();
        self.state.amount = request.amount.map(|a| a.to_string()).unwrap_or_default();
    }

    /// Start over (new transfer or navigation away)
    pub fn reset(&mut self) {
        self.state = WizardState::default();
    }
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}
