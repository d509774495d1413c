//
// bibliography/latex_text.rs
//
// LaTeX-to-Unicode normalization and display formatting for BibTeX fields
//

const ELLIPSIS: &str = "...";

/// Convert LaTeX markup in a BibTeX field to plain Unicode text.
///
/// Handles accent commands (`\"o`, `{\'e}`, `\c{c}`, `\v s`), named letters
/// (`\ss`, `\o`, `\ae`), escaped specials (`\&`, `\%`), dashes and quote
/// ligatures. Grouping braces are dropped, unknown control words are removed
/// (their braced argument survives) and whitespace runs collapse to one space.
pub fn latex_to_unicode(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => i = convert_command(&chars, i, &mut out),
            '{' | '}' => i += 1,
            '~' => {
                push_space(&mut out);
                i += 1;
            }
            '-' => {
                let run = chars[i..].iter().take_while(|&&c| c == '-').count();
                match run {
                    2 => out.push('\u{2013}'),
                    3 => out.push('\u{2014}'),
                    n => out.extend(std::iter::repeat('-').take(n)),
                }
                i += run;
            }
            '`' if chars.get(i + 1) == Some(&'`') => {
                out.push('\u{201C}');
                i += 2;
            }
            '\'' if chars.get(i + 1) == Some(&'\'') => {
                out.push('\u{201D}');
                i += 2;
            }
            c if c.is_whitespace() => {
                push_space(&mut out);
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.trim().to_string()
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

/// Convert the command starting at `chars[start] == '\\'`; returns the index
/// just past what was consumed.
fn convert_command(chars: &[char], start: usize, out: &mut String) -> usize {
    let Some(&next) = chars.get(start + 1) else {
        return start + 1;
    };

    if let Some(mark) = symbol_accent(next) {
        return apply_accent(chars, start + 2, mark, false, out);
    }

    if !next.is_ascii_alphabetic() {
        // Control symbol: \& \% \$ \_ \# \{ \} and friends
        if next.is_whitespace() {
            push_space(out);
        } else {
            out.push(next);
        }
        return start + 2;
    }

    let end = start
        + 1
        + chars[start + 1..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
    let name: String = chars[start + 1..end].iter().collect();

    if let Some(mark) = letter_accent(&name) {
        return apply_accent(chars, end, mark, true, out);
    }

    if let Some(symbol) = named_letter(&name) {
        out.push_str(symbol);
    }
    // A control word swallows the space that terminates it
    if chars.get(end).is_some_and(|c| *c == ' ') {
        end + 1
    } else {
        end
    }
}

/// Combining mark for accents written with a symbol (`\'e`)
fn symbol_accent(c: char) -> Option<char> {
    Some(match c {
        '\'' => '\u{0301}',
        '`' => '\u{0300}',
        '^' => '\u{0302}',
        '"' => '\u{0308}',
        '~' => '\u{0303}',
        '=' => '\u{0304}',
        '.' => '\u{0307}',
        _ => return None,
    })
}

/// Combining mark for accents written with a letter (`\c{c}`)
fn letter_accent(name: &str) -> Option<char> {
    Some(match name {
        "u" => '\u{0306}',
        "v" => '\u{030C}',
        "H" => '\u{030B}',
        "c" => '\u{0327}',
        "k" => '\u{0328}',
        "r" => '\u{030A}',
        "d" => '\u{0323}',
        "b" => '\u{0331}',
        _ => return None,
    })
}

fn named_letter(name: &str) -> Option<&'static str> {
    Some(match name {
        "ss" => "ß",
        "o" => "ø",
        "O" => "Ø",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "aa" => "å",
        "AA" => "Å",
        "l" => "ł",
        "L" => "Ł",
        "i" => "ı",
        "j" => "ȷ",
        "dh" => "ð",
        "DH" => "Ð",
        "th" => "þ",
        "TH" => "Þ",
        "textendash" => "\u{2013}",
        "textemdash" => "\u{2014}",
        "LaTeX" => "LaTeX",
        "TeX" => "TeX",
        _ => return None,
    })
}

/// Read the accent argument at `pos` and emit the accented letter
fn apply_accent(
    chars: &[char],
    mut pos: usize,
    mark: char,
    skip_space: bool,
    out: &mut String,
) -> usize {
    if skip_space {
        while chars.get(pos).is_some_and(|c| *c == ' ') {
            pos += 1;
        }
    }

    let (base, next) = match chars.get(pos) {
        Some('{') => {
            let close = chars[pos..]
                .iter()
                .position(|c| *c == '}')
                .map(|off| pos + off);
            let Some(close) = close else {
                return pos + 1;
            };
            (accent_base(&chars[pos + 1..close]), close + 1)
        }
        Some('\\') => match accent_base(&chars[pos..(pos + 2).min(chars.len())]) {
            Some(base) => (Some(base), pos + 2),
            // Not a dotless letter; let the caller convert the command itself
            None => return pos,
        },
        Some(c) if !c.is_whitespace() => (Some(*c), pos + 1),
        _ => (None, pos),
    };

    if let Some(base) = base {
        match compose(mark, base) {
            Some(c) => out.push(c),
            None => {
                out.push(base);
                out.push(mark);
            }
        }
    }
    next.min(chars.len())
}

/// Letter an accent applies to: `o`, or the dotless `\i` / `\j` forms
fn accent_base(arg: &[char]) -> Option<char> {
    match arg {
        ['\\', 'i', ..] => Some('i'),
        ['\\', 'j', ..] => Some('j'),
        ['\\', ..] => None,
        [c, ..] => Some(*c),
        [] => None,
    }
}

/// Precomposed form of the common Latin accented letters
fn compose(mark: char, base: char) -> Option<char> {
    Some(match (mark, base) {
        ('\u{0301}', 'a') => 'á',
        ('\u{0301}', 'e') => 'é',
        ('\u{0301}', 'i') => 'í',
        ('\u{0301}', 'o') => 'ó',
        ('\u{0301}', 'u') => 'ú',
        ('\u{0301}', 'y') => 'ý',
        ('\u{0301}', 'c') => 'ć',
        ('\u{0301}', 'n') => 'ń',
        ('\u{0301}', 's') => 'ś',
        ('\u{0301}', 'z') => 'ź',
        ('\u{0301}', 'A') => 'Á',
        ('\u{0301}', 'E') => 'É',
        ('\u{0301}', 'I') => 'Í',
        ('\u{0301}', 'O') => 'Ó',
        ('\u{0301}', 'U') => 'Ú',
        ('\u{0301}', 'Y') => 'Ý',
        ('\u{0301}', 'C') => 'Ć',
        ('\u{0301}', 'N') => 'Ń',
        ('\u{0301}', 'S') => 'Ś',
        ('\u{0301}', 'Z') => 'Ź',
        ('\u{0300}', 'a') => 'à',
        ('\u{0300}', 'e') => 'è',
        ('\u{0300}', 'i') => 'ì',
        ('\u{0300}', 'o') => 'ò',
        ('\u{0300}', 'u') => 'ù',
        ('\u{0300}', 'A') => 'À',
        ('\u{0300}', 'E') => 'È',
        ('\u{0300}', 'I') => 'Ì',
        ('\u{0300}', 'O') => 'Ò',
        ('\u{0300}', 'U') => 'Ù',
        ('\u{0302}', 'a') => 'â',
        ('\u{0302}', 'e') => 'ê',
        ('\u{0302}', 'i') => 'î',
        ('\u{0302}', 'o') => 'ô',
        ('\u{0302}', 'u') => 'û',
        ('\u{0302}', 'A') => 'Â',
        ('\u{0302}', 'E') => 'Ê',
        ('\u{0302}', 'I') => 'Î',
        ('\u{0302}', 'O') => 'Ô',
        ('\u{0302}', 'U') => 'Û',
        ('\u{0308}', 'a') => 'ä',
        ('\u{0308}', 'e') => 'ë',
        ('\u{0308}', 'i') => 'ï',
        ('\u{0308}', 'o') => 'ö',
        ('\u{0308}', 'u') => 'ü',
        ('\u{0308}', 'y') => 'ÿ',
        ('\u{0308}', 'A') => 'Ä',
        ('\u{0308}', 'E') => 'Ë',
        ('\u{0308}', 'I') => 'Ï',
        ('\u{0308}', 'O') => 'Ö',
        ('\u{0308}', 'U') => 'Ü',
        ('\u{0303}', 'a') => 'ã',
        ('\u{0303}', 'n') => 'ñ',
        ('\u{0303}', 'o') => 'õ',
        ('\u{0303}', 'A') => 'Ã',
        ('\u{0303}', 'N') => 'Ñ',
        ('\u{0303}', 'O') => 'Õ',
        ('\u{0327}', 'c') => 'ç',
        ('\u{0327}', 's') => 'ş',
        ('\u{0327}', 'C') => 'Ç',
        ('\u{0327}', 'S') => 'Ş',
        ('\u{030C}', 'c') => 'č',
        ('\u{030C}', 'e') => 'ě',
        ('\u{030C}', 'r') => 'ř',
        ('\u{030C}', 's') => 'š',
        ('\u{030C}', 'z') => 'ž',
        ('\u{030C}', 'C') => 'Č',
        ('\u{030C}', 'E') => 'Ě',
        ('\u{030C}', 'R') => 'Ř',
        ('\u{030C}', 'S') => 'Š',
        ('\u{030C}', 'Z') => 'Ž',
        ('\u{030B}', 'o') => 'ő',
        ('\u{030B}', 'u') => 'ű',
        ('\u{030B}', 'O') => 'Ő',
        ('\u{030B}', 'U') => 'Ű',
        ('\u{0306}', 'g') => 'ğ',
        ('\u{0306}', 'G') => 'Ğ',
        ('\u{030A}', 'a') => 'å',
        ('\u{030A}', 'u') => 'ů',
        ('\u{030A}', 'A') => 'Å',
        ('\u{0328}', 'a') => 'ą',
        ('\u{0328}', 'e') => 'ę',
        ('\u{0328}', 'A') => 'Ą',
        ('\u{0328}', 'E') => 'Ę',
        ('\u{0307}', 'z') => 'ż',
        ('\u{0307}', 'Z') => 'Ż',
        _ => return None,
    })
}

/// Shorten `title` to at most `max_len` characters on a word boundary,
/// appending `...` when anything was cut.
///
/// A title with no space inside the kept prefix is cut mid-word instead.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title.to_string();
    }

    let keep = (max_len + 1).saturating_sub(ELLIPSIS.len());
    let prefix: String = title.chars().take(keep).collect();
    let words: Vec<&str> = prefix.split(' ').collect();
    let mut kept = words[..words.len() - 1].join(" ");
    if kept.trim().is_empty() {
        kept = title
            .chars()
            .take(max_len.saturating_sub(ELLIPSIS.len()))
            .collect();
    }

    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// Split a BibTeX author list on top-level ` and ` separators.
pub fn split_authors(field: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut rest = field;

    while let Some(c) = rest.chars().next() {
        if depth == 0 {
            if let Some(after) = strip_and_separator(rest) {
                names.push(std::mem::take(&mut current));
                rest = after;
                continue;
            }
        }
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(c);
        rest = &rest[c.len_utf8()..];
    }
    names.push(current);

    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// `rest` with a leading whitespace-delimited `and` removed, if present
fn strip_and_separator(rest: &str) -> Option<&str> {
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let after = trimmed
        .strip_prefix("and")
        .or_else(|| trimmed.strip_prefix("AND"))?;
    if after.starts_with(char::is_whitespace) {
        Some(after.trim_start())
    } else {
        None
    }
}

/// Reorder one author name to "First Last".
///
/// Accepts "Last, First", "Last, Jr, First" and "First Last" forms.
pub fn display_name(name: &str) -> String {
    let parts = split_top_level_commas(name);
    let ordered = match parts.as_slice() {
        [last, first] if !first.is_empty() => format!("{} {}", first, last),
        [last, jr, first] if !first.is_empty() => format!("{} {} {}", first, last, jr),
        _ => name.to_string(),
    };
    latex_to_unicode(&ordered)
}

fn split_top_level_commas(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in name.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current.trim().to_string());
    parts
}

/// "First Last" for one author, "First Last et al." for several, empty for none
pub fn format_authors(field: &str) -> String {
    let names = split_authors(field);
    match names.as_slice() {
        [] => String::new(),
        [only] => display_name(only),
        [first, ..] => format!("{} et al.", display_name(first)),
    }
}

/// Build citation detail text from raw `title` and `author` fields.
///
/// Returns `None` when both are empty.
pub fn display_detail(title: Option<&str>, author: Option<&str>, max_title: usize) -> Option<String> {
    let title = truncate_title(&latex_to_unicode(title.unwrap_or_default()), max_title);
    let authors = format_authors(author.unwrap_or_default());
    match (title.is_empty(), authors.is_empty()) {
        (false, false) => Some(format!("{} ({})", title, authors)),
        (false, true) => Some(title),
        (true, false) => Some(authors),
        (true, true) => None,
    }
}
