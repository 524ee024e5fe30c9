//! Terminal output: colored messages, progress lines and number formatting.

use std::{
    fmt,
    io::{stdout, Write},
    time::Duration,
};

use term_painter::{Color, Painted, Style, ToStyle};


/// Prints a message of the given kind. The body is wrapped to the terminal
/// width.
macro_rules! print_msg {
    ($kind:ident => $($args:tt)*) => {
        crate::ui::print_msg(crate::ui::MsgKind::$kind, format_args!($($args)*))
    };
}

/// Prints `$fmt ...`, evaluates `$body` and marks the line as done,
/// including the time it took. Evaluates to the value of `$body`.
macro_rules! progress {
    ([$($args:tt)*] => $body:expr) => {{
        let task = format!($($args)*);
        crate::ui::progress_start(&task);
        let before = std::time::Instant::now();
        let out = $body;
        crate::ui::progress_done(&task, before.elapsed());
        out
    }};
}

macro_rules! info {
    () => { info!("") };
    ($($t:tt)*) => { print_msg!(Info => $($t)*) };
}

macro_rules! warn {
    () => { warn!("") };
    ($($t:tt)*) => { print_msg!(Warning => $($t)*) };
}

macro_rules! error {
    () => { error!("") };
    ($($t:tt)*) => { print_msg!(Error => $($t)*) };
}

#[derive(Debug, Clone, Copy)]
pub enum MsgKind {
    Error,
    Warning,
    Info,
    Progress,
}

impl MsgKind {
    fn icon(self) -> char {
        match self {
            MsgKind::Error => '!',
            MsgKind::Warning => 'w',
            MsgKind::Info => 'i',
            MsgKind::Progress => '…',
        }
    }

    fn icon_style(self) -> Style {
        match self {
            MsgKind::Error => Color::Red.bold(),
            MsgKind::Warning => Color::Yellow.bold(),
            MsgKind::Info => Color::Blue.bold(),
            MsgKind::Progress => Color::Green.bold(),
        }
    }

    fn body_style(self) -> Style {
        match self {
            MsgKind::Error => Color::BrightRed.to_style(),
            MsgKind::Warning => Color::BrightYellow.to_style(),
            MsgKind::Info | MsgKind::Progress => Color::NotSet.to_style(),
        }
    }
}

pub fn print_msg(kind: MsgKind, body: fmt::Arguments<'_>) {
    let width = term_size::dimensions().map_or(80, |(w, _)| w).min(100);
    let lines = wrap(&body.to_string(), width.saturating_sub(7).max(20));

    let icon_style = kind.icon_style();
    for (i, line) in lines.iter().enumerate() {
        let prefix = match i {
            0 => format!("[{}] ", kind.icon()),
            _ if i == lines.len() - 1 => "    └ ".to_string(),
            _ => "    │ ".to_string(),
        };
        println!("{}{}", icon_style.paint(prefix), kind.body_style().paint(line));
    }
}

pub fn progress_start(task: &str) {
    let kind = MsgKind::Progress;
    print!("{}{} ... ", kind.icon_style().paint("[…] "), kind.body_style().paint(task));
    let _ = stdout().flush();
}

pub fn progress_done(task: &str, time: Duration) {
    let kind = MsgKind::Progress;
    println!(
        "\r{}{} ... {} (in {:.2?})",
        kind.icon_style().paint("[✓] "),
        kind.body_style().paint(task),
        kind.icon_style().paint("done"),
        time,
    );
}

/// Splits `text` into lines of at most `width` characters, breaking at
/// whitespace. Words longer than `width` get a line of their own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::replace(&mut line, String::new()));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    lines.push(line);

    lines
}

/// An element count, highlighted and with thousand separators.
pub fn count(n: usize) -> Painted<String> {
    Color::BrightWhite.bold().paint(fmt_with_thousand_sep(n as u64))
}

/// Formats the given integer with `,` as thousand separator.
pub fn fmt_with_thousand_sep(mut v: u64) -> String {
    let mut groups = Vec::new();
    loop {
        groups.push(v % 1000);
        v /= 1000;
        if v == 0 {
            break;
        }
    }

    let mut out = groups.pop().unwrap_or(0).to_string();
    for group in groups.iter().rev() {
        out.push_str(&format!(",{:03}", group));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_sep() {
        assert_eq!(fmt_with_thousand_sep(0), "0");
        assert_eq!(fmt_with_thousand_sep(999), "999");
        assert_eq!(fmt_with_thousand_sep(1_000), "1,000");
        assert_eq!(fmt_with_thousand_sep(12_045_007), "12,045,007");
    }

    #[test]
    fn wrap_at_whitespace() {
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("linked 8 vertices", 10), vec!["linked 8", "vertices"]);
        assert_eq!(wrap("a tetrahedralization", 5), vec!["a", "tetrahedralization"]);
        assert_eq!(wrap("  many   spaces  ", 40), vec!["many spaces"]);
    }
}
