//! Refund form totals for the organizer order view.

use shared::domain::Amount;

use crate::filters::format_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundLine {
    pub price: Amount,
    pub checked: bool,
    /// Lines for items that cannot be refunded are rendered disabled and
    /// never count toward the total.
    pub enabled: bool,
}

impl RefundLine {
    pub fn new(price: Amount) -> Self {
        Self {
            price,
            checked: false,
            enabled: true,
        }
    }

    fn counts(&self) -> bool {
        self.enabled && self.checked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundSummary {
    pub amount_text: String,
    pub item_count: usize,
    pub custom_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundForm {
    lines: Vec<RefundLine>,
    custom_amount: Option<Amount>,
    custom_mode: bool,
}

impl RefundForm {
    /// A pre-filled custom amount that disagrees with the checked lines puts
    /// the form straight into custom mode.
    pub fn new(lines: Vec<RefundLine>, custom_amount: Option<Amount>) -> Self {
        let mut form = Self {
            lines,
            custom_amount,
            custom_mode: false,
        };
        form.custom_mode = matches!(custom_amount, Some(amount) if amount != form.default_amount());
        form.sync_custom_amount();
        form
    }

    pub fn lines(&self) -> &[RefundLine] {
        &self.lines
    }

    pub fn set_checked(&mut self, index: usize, checked: bool) -> bool {
        let Some(line) = self.lines.get_mut(index) else {
            return false;
        };
        if !line.enabled {
            return false;
        }
        line.checked = checked;
        self.sync_custom_amount();
        true
    }

    pub fn default_amount(&self) -> Amount {
        self.lines
            .iter()
            .filter(|line| line.counts())
            .map(|line| line.price)
            .sum()
    }

    pub fn item_count(&self) -> usize {
        self.lines.iter().filter(|line| line.counts()).count()
    }

    pub fn is_custom(&self) -> bool {
        self.custom_mode
    }

    pub fn toggle_custom_amount(&mut self) {
        self.custom_mode = !self.custom_mode;
        self.sync_custom_amount();
    }

    pub fn set_custom_amount(&mut self, amount: Amount) {
        self.custom_amount = Some(amount);
    }

    /// The amount that would be submitted.
    pub fn amount(&self) -> Amount {
        if self.custom_mode {
            self.custom_amount.unwrap_or_else(|| self.default_amount())
        } else {
            self.default_amount()
        }
    }

    pub fn summary(&self, currency: &str) -> RefundSummary {
        RefundSummary {
            amount_text: format_money(self.default_amount(), currency),
            item_count: self.item_count(),
            custom_mode: self.custom_mode,
        }
    }

    // Outside custom mode the custom input mirrors the computed total.
    fn sync_custom_amount(&mut self) {
        if !self.custom_mode {
            self.custom_amount = Some(self.default_amount());
        }
    }
}

#[cfg(test)]
#[path = "tests/refund_tests.rs"]
mod tests;
