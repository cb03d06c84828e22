//! Terminal rendering of the wallet card.
//!
//! A single renderer parameterized by `Theme`; light/dark mode and the
//! accent colour only change the escape codes, never the layout.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::state::BalanceState;
use crate::account::balance::DISPLAY_SYMBOL;
use crate::account::AccountId;

const RULE_WIDTH: usize = 48;
const RESET: &str = "\x1B[0m";
const BOLD: &str = "\x1B[1m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            ThemeMode::Light => "☀",
            ThemeMode::Dark => "☾",
        }
    }

    /// Secondary text colour for labels.
    fn muted(self) -> (u8, u8, u8) {
        match self {
            ThemeMode::Light => (0x52, 0x52, 0x5b),
            ThemeMode::Dark => (0xa1, 0xa1, 0xaa),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    pub accent: (u8, u8, u8),
    pub title: String,
    pub color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Light,
            accent: (0x4f, 0x46, 0xe5),
            title: "Solana Wallet Connect".to_string(),
            color: true,
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

impl Theme {
    pub fn toggle(&mut self) {
        self.mode = self.mode.toggled();
    }

    fn paint(&self, text: &str, rgb: (u8, u8, u8)) -> String {
        if !self.color {
            return text.to_string();
        }
        let (r, g, b) = rgb;
        format!("{}\x1B[38;2;{};{};{}m{}{}", BOLD, r, g, b, text, RESET)
    }

    fn label(&self, text: &str) -> String {
        self.paint(text, self.mode.muted())
    }

    fn highlight(&self, text: &str) -> String {
        self.paint(text, self.accent)
    }
}

/// Render the card for the connected account (if any) and balance state.
pub fn render_card(theme: &Theme, account: Option<&AccountId>, state: &BalanceState) -> String {
    let mut out = String::new();
    let header = format!("== {} ", theme.title);
    let fill = RULE_WIDTH.saturating_sub(header.chars().count());
    let _ = writeln!(
        out,
        "{}{} [{}]",
        theme.highlight(&header),
        theme.highlight(&"=".repeat(fill)),
        theme.mode.icon()
    );

    let Some(account) = account else {
        let _ = writeln!(out, "No wallet connected.");
        let _ = writeln!(out, "Type `connect <address>` to connect a wallet.");
        return out;
    };

    let _ = writeln!(out, "{}", theme.label("Wallet Address"));
    let _ = writeln!(out, "  {}", account);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", theme.label("Balance"));

    let line = match state {
        BalanceState::Ready { balance, .. } => {
            theme.highlight(&format!("{} {}", balance.display_amount(), DISPLAY_SYMBOL))
        }
        BalanceState::Loading { .. } => "loading…".to_string(),
        BalanceState::Failed { reason, .. } => {
            format!("error: {} (type `retry`)", reason)
        }
        BalanceState::NoAccount => format!("-- {}", DISPLAY_SYMBOL),
    };
    let _ = writeln!(out, "  {}", line);
    out
}
