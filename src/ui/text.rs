/// Chat prefix used when `messages.prefix` is not configured.
pub const PREFIX: &str = "&8[&6grvTags&8] ";
pub const SEPARATOR: &str = "&8&m----------------------------------------";

const PROGRESS_CELLS: usize = 10;

/// Translates `&` colour codes into the `§` form the client understands.
pub fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if let Some(&code) = chars.peek() {
                if is_format_code(code) {
                    out.push('§');
                    out.push(code.to_ascii_lowercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn is_format_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r' | 'x')
}

/// Removes both `&` and `§` codes, for console output.
pub fn strip_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' || c == '§' {
            if let Some(&code) = chars.peek() {
                if is_format_code(code) {
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub fn progress_color(percentage: f64) -> &'static str {
    if percentage >= 100.0 {
        "&6"
    } else if percentage >= 75.0 {
        "&a"
    } else if percentage >= 50.0 {
        "&e"
    } else if percentage >= 25.0 {
        "&6"
    } else {
        "&c"
    }
}

pub fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * PROGRESS_CELLS as f64).round() as usize;
    let color = progress_color(percentage);
    let mut bar = String::from("&8[");
    for cell in 0..PROGRESS_CELLS {
        if cell < filled {
            bar.push_str(color);
        } else {
            bar.push_str("&7");
        }
        bar.push('■');
    }
    bar.push_str("&8]");
    bar
}
