//! Quote-aware parsing of command directives into the closed [`ShellAst`].
//!
//! The grammar deliberately covers only simple commands, `|` pipelines, and
//! `&&`/`||` chains. Everything else the full shell language offers is still
//! recognized, but only far enough to name it: expansions are masked out
//! first so operators inside `$(...)` never split segments, then the line is
//! split at compound operators, then each segment is classified.

use thiserror::Error;

use super::types::{
    Expansion, LogicalOp, Part, Redirect, ShellAst, SimpleCommand, Word,
};

/// Malformed directive text; the caller attaches the line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SyntaxError(String);

impl SyntaxError {
    fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Operators found between segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pipe,
    AndAnd,
    OrOr,
    Semi,
    Amp,
}

/// An expansion extracted during masking: its kind and original text.
#[derive(Debug, Clone)]
struct MaskedExpansion {
    kind: Expansion,
    raw: String,
}

struct Masked {
    text: String,
    expansions: Vec<MaskedExpansion>,
}

/// Parse one command directive.
///
/// Rejected shell constructs parse successfully into their marker kind;
/// turning them into errors is the validator's job. `Err` here means the
/// line is not shell at all (unterminated quote, stray operator, ...).
pub fn parse(command: &str) -> Result<ShellAst, SyntaxError> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(SyntaxError::new("empty command"));
    }
    check_quotes(trimmed)?;
    let masked = mask_expansions(trimmed)?;
    let (mut segments, mut operators) = split_operators(&masked.text)?;

    // One trailing semicolon is shell noise, not a compound list.
    if operators.last() == Some(&Op::Semi) && segments.last().is_some_and(|s| s.is_empty()) {
        operators.pop();
        segments.pop();
    }

    for seg in &segments {
        if let Some(kind) = seg.split_whitespace().next().and_then(rejected_keyword) {
            return Ok(kind);
        }
    }
    for seg in &segments {
        if let Some(kind) = scan_parens(seg)? {
            return Ok(kind);
        }
    }
    // Brace groups split at their inner semicolons, so the `{` token check
    // must come after the paren scan or `f() { ...; }` would land here.
    if segments
        .iter()
        .any(|seg| matches!(seg.split_whitespace().next(), Some("{" | "}")))
    {
        return Ok(ShellAst::CompoundList);
    }
    if operators.iter().any(|op| matches!(op, Op::Semi | Op::Amp)) {
        return Ok(ShellAst::CompoundList);
    }
    if segments.iter().any(String::is_empty) {
        return Err(SyntaxError::new("missing command between operators"));
    }

    let commands: Vec<SimpleCommand> = segments
        .iter()
        .map(|seg| parse_segment(seg, &masked.expansions))
        .collect();
    build_ast(commands, operators).ok_or_else(|| SyntaxError::new("empty command"))
}

/// Reject unterminated quoting up front; every later scan assumes balance.
fn check_quotes(command: &str) -> Result<(), SyntaxError> {
    let (mut sq, mut dq, mut esc) = (false, false, false);
    for c in command.chars() {
        if esc {
            esc = false;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            continue;
        }
    }
    if sq {
        return Err(SyntaxError::new("unterminated single quote"));
    }
    if dq {
        return Err(SyntaxError::new("unterminated double quote"));
    }
    if esc {
        return Err(SyntaxError::new("trailing backslash"));
    }
    Ok(())
}

/// Replace every expansion with a `__EXPn__` placeholder, recording its
/// kind and original text.
///
/// Single quotes block all expansion. Double quotes block only process
/// substitution, matching what the shell itself expands there.
fn mask_expansions(command: &str) -> Result<Masked, SyntaxError> {
    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut outer = String::new();
    let mut expansions: Vec<MaskedExpansion> = Vec::new();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    fn push(outer: &mut String, expansions: &mut Vec<MaskedExpansion>, kind: Expansion, raw: String) {
        outer.push_str(&format!("__EXP{}__", expansions.len()));
        expansions.push(MaskedExpansion { kind, raw });
    }

    while i < len {
        let c = chars[i];
        if esc {
            outer.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            outer.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            outer.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            outer.push(c);
            i += 1;
            continue;
        }
        if sq {
            outer.push(c);
            i += 1;
            continue;
        }

        // $(( ... )) before $( ... )
        if c == '$' && i + 2 < len && chars[i + 1] == '(' && chars[i + 2] == '(' {
            let end = find_closing(&chars, i + 3, '(', ')', 2)
                .ok_or_else(|| SyntaxError::new("unterminated arithmetic expansion"))?;
            let raw: String = chars[i..end].iter().collect();
            push(&mut outer, &mut expansions, Expansion::Arithmetic, raw);
            i = end;
            continue;
        }
        if c == '$' && i + 1 < len && chars[i + 1] == '(' {
            let end = find_closing(&chars, i + 2, '(', ')', 1)
                .ok_or_else(|| SyntaxError::new("unterminated command substitution"))?;
            let raw: String = chars[i..end].iter().collect();
            push(&mut outer, &mut expansions, Expansion::Command, raw);
            i = end;
            continue;
        }
        if c == '$' && i + 1 < len && chars[i + 1] == '{' {
            let end = find_closing(&chars, i + 2, '{', '}', 1)
                .ok_or_else(|| SyntaxError::new("unterminated parameter expansion"))?;
            let raw: String = chars[i..end].iter().collect();
            push(&mut outer, &mut expansions, Expansion::Parameter, raw);
            i = end;
            continue;
        }
        if c == '$' && i + 1 < len {
            let next = chars[i + 1];
            if next == '_' || next.is_ascii_alphabetic() {
                let mut j = i + 1;
                while j < len && (chars[j] == '_' || chars[j].is_ascii_alphanumeric()) {
                    j += 1;
                }
                let raw: String = chars[i..j].iter().collect();
                push(&mut outer, &mut expansions, Expansion::Parameter, raw);
                i = j;
                continue;
            }
            if next.is_ascii_digit() || matches!(next, '?' | '@' | '*' | '#' | '$' | '!' | '-') {
                let raw: String = chars[i..i + 2].iter().collect();
                push(&mut outer, &mut expansions, Expansion::Parameter, raw);
                i += 2;
                continue;
            }
        }
        if c == '`' {
            let mut j = i + 1;
            let mut closed = false;
            while j < len {
                if chars[j] == '\\' && j + 1 < len {
                    j += 2;
                    continue;
                }
                if chars[j] == '`' {
                    closed = true;
                    break;
                }
                j += 1;
            }
            if !closed {
                return Err(SyntaxError::new("unterminated backquote"));
            }
            let raw: String = chars[i..=j].iter().collect();
            push(&mut outer, &mut expansions, Expansion::Command, raw);
            i = j + 1;
            continue;
        }
        if (c == '<' || c == '>') && !dq && i + 1 < len && chars[i + 1] == '(' {
            let end = find_closing(&chars, i + 2, '(', ')', 1)
                .ok_or_else(|| SyntaxError::new("unterminated process substitution"))?;
            let raw: String = chars[i..end].iter().collect();
            push(&mut outer, &mut expansions, Expansion::Process, raw);
            i = end;
            continue;
        }

        outer.push(c);
        i += 1;
    }

    Ok(Masked {
        text: outer,
        expansions,
    })
}

/// Find the index one past the delimiter closing `depth` already-open
/// delimiters, honoring quotes and escapes inside.
fn find_closing(chars: &[char], start: usize, open: char, close: char, depth: u32) -> Option<usize> {
    let mut depth = depth;
    let mut i = start;
    let (mut sq, mut dq, mut esc) = (false, false, false);
    while i < chars.len() {
        let c = chars[i];
        if esc {
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            i += 1;
            continue;
        }
        if !sq && !dq {
            if c == open {
                depth += 1;
            }
            if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
        }
        i += 1;
    }
    None
}

/// Split at `&&`, `||`, `|`, `;`, `&` outside quotes.
///
/// Always returns one more segment than operator so abutting operators show
/// up as empty segments. Segments are trimmed.
fn split_operators(command: &str) -> Result<(Vec<String>, Vec<Op>), SyntaxError> {
    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut parts = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];
        if esc {
            buf.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            i += 1;
            continue;
        }
        if sq || dq {
            buf.push(c);
            i += 1;
            continue;
        }

        if i + 1 < len {
            let next = chars[i + 1];
            if c == '|' && next == '&' {
                return Err(SyntaxError::new("`|&` is not supported"));
            }
            let op = match (c, next) {
                ('&', '&') => Some(Op::AndAnd),
                ('|', '|') => Some(Op::OrOr),
                _ => None,
            };
            if let Some(op) = op {
                parts.push(buf.trim().to_string());
                operators.push(op);
                buf.clear();
                i += 2;
                continue;
            }
        }

        let op = match c {
            '|' => Some(Op::Pipe),
            ';' => Some(Op::Semi),
            // `&>` is a redirect, not a background `&`.
            '&' if chars.get(i + 1) != Some(&'>') => Some(Op::Amp),
            _ => None,
        };
        if let Some(op) = op {
            parts.push(buf.trim().to_string());
            operators.push(op);
            buf.clear();
            i += 1;
            continue;
        }

        buf.push(c);
        i += 1;
    }

    parts.push(buf.trim().to_string());
    Ok((parts, operators))
}

fn rejected_keyword(token: &str) -> Option<ShellAst> {
    match token {
        "for" => Some(ShellAst::For),
        "while" => Some(ShellAst::While),
        "until" => Some(ShellAst::Until),
        "if" => Some(ShellAst::If),
        "case" => Some(ShellAst::Case),
        "function" => Some(ShellAst::Function),
        _ => None,
    }
}

/// Classify unquoted parentheses left after masking: a leading `(` is a
/// subshell, `name()` is a function definition, anything else is a stray
/// token the shell itself would reject.
fn scan_parens(segment: &str) -> Result<Option<ShellAst>, SyntaxError> {
    if segment.starts_with('(') {
        return Ok(Some(ShellAst::Subshell));
    }
    let chars: Vec<char> = segment.chars().collect();
    let (mut sq, mut dq, mut esc) = (false, false, false);
    for (i, &c) in chars.iter().enumerate() {
        if esc {
            esc = false;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            continue;
        }
        if sq || dq {
            continue;
        }
        if c == '(' {
            if is_function_definition(&chars, i) {
                return Ok(Some(ShellAst::Function));
            }
            return Err(SyntaxError::new("unexpected `(`"));
        }
        if c == ')' {
            return Err(SyntaxError::new("unexpected `)`"));
        }
    }
    Ok(None)
}

/// `name()` with the name a lone identifier before the parens.
fn is_function_definition(chars: &[char], open: usize) -> bool {
    if chars.get(open + 1) != Some(&')') {
        return false;
    }
    let before: String = chars[..open].iter().collect();
    is_identifier(before.trim())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Build one segment's [`SimpleCommand`]: argv via shlex, plus the
/// structural prefix/name/suffix word list from the masked text.
fn parse_segment(masked: &str, expansions: &[MaskedExpansion]) -> SimpleCommand {
    let text = restore(masked, expansions);
    let mut tokens = tokenize(&text).into_iter();
    let program = tokens.next().unwrap_or_default();
    let args: Vec<String> = tokens.collect();

    let mut name: Option<Word> = None;
    let mut prefix = Vec::new();
    let mut suffix = Vec::new();
    for raw in split_raw_words(masked) {
        let part = classify_word(&raw, name.is_none(), expansions);
        match part {
            Part::Word(word) if name.is_none() => name = Some(word),
            part if name.is_none() => prefix.push(part),
            part => suffix.push(part),
        }
    }

    SimpleCommand {
        text: text.trim().to_string(),
        program,
        args,
        name,
        prefix,
        suffix,
    }
}

/// Tokenize with shlex; fall back to whitespace splitting for inputs shlex
/// rejects.
fn tokenize(text: &str) -> Vec<String> {
    shlex::split(text)
        .unwrap_or_else(|| text.split_whitespace().map(str::to_string).collect())
}

/// Split a masked segment into raw words at unquoted whitespace, keeping
/// quotes in place.
fn split_raw_words(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut buf = String::new();
    let (mut sq, mut dq, mut esc) = (false, false, false);
    for c in segment.chars() {
        if esc {
            buf.push(c);
            esc = false;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            continue;
        }
        if !sq && !dq && c.is_whitespace() {
            if !buf.is_empty() {
                words.push(std::mem::take(&mut buf));
            }
            continue;
        }
        buf.push(c);
    }
    if !buf.is_empty() {
        words.push(buf);
    }
    words
}

fn classify_word(masked_word: &str, before_name: bool, expansions: &[MaskedExpansion]) -> Part {
    if let Some(op) = redirect_op(masked_word) {
        return Part::Redirect(Redirect { op });
    }
    if before_name && is_assignment(masked_word) {
        return Part::Assignment(restore(masked_word, expansions));
    }
    Part::Word(Word {
        text: restore(masked_word, expansions),
        expansions: word_expansions(masked_word, expansions),
    })
}

/// First unquoted redirection operator in a word, with its fd digits and
/// duplication suffix (`2>&1`) pulled in. Process substitutions were masked
/// before this scan, so `<(` never lands here.
fn redirect_op(word: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    let (mut sq, mut dq, mut esc) = (false, false, false);
    for (i, &c) in chars.iter().enumerate() {
        if esc {
            esc = false;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            continue;
        }
        if sq || dq {
            continue;
        }
        if c == '<' || c == '>' {
            let mut start = i;
            while start > 0 && chars[start - 1].is_ascii_digit() {
                start -= 1;
            }
            if start > 0 && chars[start - 1] == '&' {
                start -= 1;
            }
            let mut end = i;
            while end < chars.len()
                && (chars[end].is_ascii_digit() || matches!(chars[end], '<' | '>' | '&' | '-'))
            {
                end += 1;
            }
            return Some(chars[start..end].iter().collect());
        }
    }
    None
}

/// `NAME=...` with a valid identifier before the first `=`.
fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => is_identifier(name),
        None => false,
    }
}

/// Expansion kinds referenced by a masked word, in order of appearance.
fn word_expansions(masked_word: &str, expansions: &[MaskedExpansion]) -> Vec<Expansion> {
    let mut found = Vec::new();
    let mut rest = masked_word;
    while let Some(pos) = rest.find("__EXP") {
        let after = &rest[pos + 5..];
        let digits: String = after.chars().take_while(char::is_ascii_digit).collect();
        let tail = &after[digits.len()..];
        if !digits.is_empty() && tail.starts_with("__") {
            if let Ok(idx) = digits.parse::<usize>()
                && let Some(e) = expansions.get(idx)
            {
                found.push(e.kind);
            }
            rest = &tail[2..];
        } else {
            rest = after;
        }
    }
    found
}

/// Substitute placeholders back with the original expansion text.
fn restore(masked: &str, expansions: &[MaskedExpansion]) -> String {
    let mut out = masked.to_string();
    for (i, e) in expansions.iter().enumerate() {
        out = out.replacen(&format!("__EXP{i}__"), &e.raw, 1);
    }
    out
}

/// Fold segments and operators into the final tree. Pipes bind tighter
/// than `&&`/`||`, which associate left.
fn build_ast(commands: Vec<SimpleCommand>, operators: Vec<Op>) -> Option<ShellAst> {
    let mut commands = commands.into_iter();
    let mut groups = vec![vec![commands.next()?]];
    let mut joins = Vec::new();
    for (op, cmd) in operators.into_iter().zip(commands) {
        match op {
            Op::Pipe => {
                if let Some(last) = groups.last_mut() {
                    last.push(cmd);
                }
            }
            Op::AndAnd => {
                joins.push(LogicalOp::And);
                groups.push(vec![cmd]);
            }
            Op::OrOr => {
                joins.push(LogicalOp::Or);
                groups.push(vec![cmd]);
            }
            Op::Semi | Op::Amp => return None, // diverted to CompoundList earlier
        }
    }
    let mut groups = groups.into_iter().map(group_ast);
    let first = groups.next()?;
    Some(joins.into_iter().zip(groups).fold(first, |left, (op, right)| {
        ShellAst::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }))
}

fn group_ast(mut group: Vec<SimpleCommand>) -> ShellAst {
    if group.len() == 1 {
        ShellAst::Command(group.remove(0))
    } else {
        ShellAst::Pipeline(group)
    }
}
