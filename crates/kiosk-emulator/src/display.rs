//! Virtual kiosk screen.
//!
//! [`VirtualDisplay`] keeps an in-memory model of what the kiosk shows and
//! renders it as a two-line text panel:
//!
//! - line 0: the current message, centered
//! - line 1: the status area (amount owed and inactivity countdown, the
//!   operator countdown, the zeroing prompt, or the out-of-service notice)
//!
//! Below the panel a footer lists the message severity, the enabled inputs
//! and the drawer balance.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::{Cents, Severity};
//! use kiosk_emulator::VirtualDisplay;
//! use kiosk_hardware::KioskDisplay;
//!
//! let mut display = VirtualDisplay::new();
//! display.show_message("Insert coins", Severity::Info);
//! display.show_remaining_amount(Cents::new(70));
//! display.show_inactivity_countdown(18);
//!
//! assert_eq!(display.line(0).unwrap().trim(), "Insert coins");
//! assert_eq!(display.line(1).unwrap().trim(), "Remaining 0.70 EUR  18s");
//! ```
//!
//! ## Builder Pattern
//!
//! ```
//! use kiosk_emulator::VirtualDisplay;
//!
//! let display = VirtualDisplay::builder()
//!     .with_columns(24)
//!     .with_initial_message("Starting".to_string())
//!     .build();
//!
//! assert_eq!(display.line(0).unwrap().len(), 24);
//! ```

use kiosk_core::{Cents, InputCategory, Severity};
use kiosk_hardware::KioskDisplay;

/// Default panel width in characters.
const DEFAULT_COLUMNS: usize = 40;

const OUT_OF_SERVICE_MESSAGE: &str = "OUT OF SERVICE - Wait for operator";

/// Text alignment options for panel lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered with equal padding on both sides (extra space on right if odd).
    Center,
    /// Text ends at the last column, padded with spaces on the left.
    Right,
}

/// In-memory kiosk screen.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    columns: usize,
    message: String,
    severity: Severity,
    remaining: Option<Cents>,
    inactivity_secs: Option<u32>,
    maintenance_secs: Option<u32>,
    zero_prompt: Option<Cents>,
    out_of_service: bool,
    enabled_inputs: Vec<InputCategory>,
    person_passed_visible: bool,
    drawer_balance: Cents,
    revision: u64,
}

impl VirtualDisplay {
    /// Create a 40 column display with an empty message.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for a display with custom width or initial message.
    pub fn builder() -> VirtualDisplayBuilder {
        VirtualDisplayBuilder::default()
    }

    /// Current message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity of the current message.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns `true` while the out-of-service screen is shown.
    pub fn is_out_of_service(&self) -> bool {
        self.out_of_service
    }

    pub fn is_input_enabled(&self, category: InputCategory) -> bool {
        self.enabled_inputs.contains(&category)
    }

    /// Enabled inputs, in display order.
    pub fn enabled_inputs(&self) -> Vec<InputCategory> {
        InputCategory::ALL
            .into_iter()
            .filter(|c| self.is_input_enabled(*c))
            .collect()
    }

    pub fn is_person_passed_visible(&self) -> bool {
        self.person_passed_visible
    }

    pub fn drawer_balance(&self) -> Cents {
        self.drawer_balance
    }

    /// Counter bumped on every change, for redrawing only when needed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rendered panel line, padded to the panel width.
    ///
    /// # Returns
    ///
    /// Returns `None` for any index other than 0 and 1.
    pub fn line(&self, index: usize) -> Option<String> {
        match index {
            0 => Some(align_text(
                &sanitize_text(&self.message),
                self.columns,
                Alignment::Center,
            )),
            1 => Some(align_text(&self.status_text(), self.columns, Alignment::Left)),
            _ => None,
        }
    }

    /// Both panel lines.
    pub fn lines(&self) -> [String; 2] {
        [self.line(0).unwrap_or_default(), self.line(1).unwrap_or_default()]
    }

    /// Render the panel with a border and a footer.
    pub fn render(&self) -> String {
        let border = format!("+{}+", "-".repeat(self.columns));
        let [top, bottom] = self.lines();

        let inputs = self
            .enabled_inputs()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let inputs = if inputs.is_empty() {
            "none".to_string()
        } else {
            inputs.join(",")
        };
        let passed = if self.person_passed_visible {
            " | [person passed]"
        } else {
            ""
        };

        format!(
            "{border}\n|{top}|\n|{bottom}|\n{border}\n {} | inputs: {inputs} | drawer {}{passed}",
            self.severity, self.drawer_balance
        )
    }

    fn status_text(&self) -> String {
        if self.out_of_service {
            return "Alarm active".to_string();
        }
        if let Some(balance) = self.zero_prompt {
            return format!("Zero drawer ({balance})? yes / no");
        }
        if let Some(seconds) = self.maintenance_secs {
            return format!("Authenticate within {seconds}s");
        }
        match (self.remaining, self.inactivity_secs) {
            (Some(remaining), Some(seconds)) => format!("Remaining {remaining}  {seconds}s"),
            (Some(remaining), None) => format!("Remaining {remaining}"),
            (None, Some(seconds)) => format!("{seconds}s"),
            (None, None) => String::new(),
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskDisplay for VirtualDisplay {
    fn show_message(&mut self, text: &str, severity: Severity) {
        self.message = sanitize_text(text);
        self.severity = severity;
        self.out_of_service = false;
        self.touch();
    }

    fn show_remaining_amount(&mut self, remaining: Cents) {
        self.remaining = Some(remaining);
        self.touch();
    }

    fn hide_remaining_amount(&mut self) {
        self.remaining = None;
        self.touch();
    }

    fn show_inactivity_countdown(&mut self, seconds: u32) {
        self.inactivity_secs = Some(seconds);
        self.touch();
    }

    fn hide_inactivity_countdown(&mut self) {
        self.inactivity_secs = None;
        self.touch();
    }

    fn show_maintenance_countdown(&mut self, seconds: u32) {
        self.maintenance_secs = (seconds > 0).then_some(seconds);
        self.touch();
    }

    fn show_zero_choice_prompt(&mut self, balance: Cents) {
        self.zero_prompt = Some(balance);
        self.message = format!("Zero coin balance ({balance})?");
        self.severity = Severity::Warning;
        self.touch();
    }

    fn hide_zero_choice_prompt(&mut self) {
        self.zero_prompt = None;
        self.touch();
    }

    fn show_out_of_service(&mut self) {
        self.message = OUT_OF_SERVICE_MESSAGE.to_string();
        self.severity = Severity::Error;
        self.out_of_service = true;
        self.touch();
    }

    fn set_input_enabled(&mut self, category: InputCategory, enabled: bool) {
        let present = self.is_input_enabled(category);
        if enabled && !present {
            self.enabled_inputs.push(category);
        } else if !enabled && present {
            self.enabled_inputs.retain(|c| *c != category);
        }
        self.touch();
    }

    fn set_person_passed_button_visible(&mut self, visible: bool) {
        self.person_passed_visible = visible;
        self.touch();
    }

    fn show_drawer_balance(&mut self, balance: Cents) {
        self.drawer_balance = balance;
        self.touch();
    }
}

/// Builder for constructing `VirtualDisplay` instances with custom configuration.
#[derive(Debug)]
pub struct VirtualDisplayBuilder {
    columns: usize,
    initial_message: String,
}

impl VirtualDisplayBuilder {
    /// Set the panel width in characters.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Set the message shown before the kiosk draws its first screen.
    pub fn with_initial_message(mut self, message: String) -> Self {
        self.initial_message = message;
        self
    }

    pub fn build(self) -> VirtualDisplay {
        VirtualDisplay {
            columns: self.columns,
            message: sanitize_text(&self.initial_message),
            severity: Severity::Info,
            remaining: None,
            inactivity_secs: None,
            maintenance_secs: None,
            zero_prompt: None,
            out_of_service: false,
            enabled_inputs: Vec::new(),
            person_passed_visible: false,
            drawer_balance: Cents::ZERO,
            revision: 0,
        }
    }
}

impl Default for VirtualDisplayBuilder {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            initial_message: String::new(),
        }
    }
}

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use kiosk_emulator::truncate_text;
///
/// assert_eq!(truncate_text("Insert coins", 6), "Insert");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align text within a fixed width, padding with spaces.
///
/// # Arguments
///
/// * `text` - Text to align
/// * `width` - Target width in characters
/// * `alignment` - Alignment mode (Left, Center, or Right)
///
/// # Returns
///
/// Returns aligned and padded string exactly `width` characters long.
///
/// # Examples
///
/// ```
/// use kiosk_emulator::{align_text, Alignment};
///
/// assert_eq!(align_text("HELLO", 10, Alignment::Left), "HELLO     ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Center), "  HELLO   ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Right), "     HELLO");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Remove control characters and surrounding whitespace.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}
