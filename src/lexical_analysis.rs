//! Regex-driven lexer that turns Logo source text into a flat token stream.

use lazy_static::lazy_static;
use regex::Regex;

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    To,
    End,
    True,
    False,
    Nil,
    Number,
    Symbol,
    Quote,
    Reference,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Newline,
    Comment,
    Whitespace,
    Error,
    Eof,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
    pub line_num: usize,
    pub col_num: usize,
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

fn make_rule(token_class: TokenClass, pattern: &str) -> TokenRule {
    TokenRule {
        token_class,
        regex: Regex::new(pattern).expect("Unable to compile token rule regex."),
    }
}

// Vector of regex patterns that correspond to each token class. Every
// pattern is anchored at the start of the remaining input. Order matters
// when two rules match the same length: the earlier rule wins, which is how
// keywords beat symbols.
lazy_static! {
    static ref token_rules: Vec<TokenRule> = vec![
        make_rule(TokenClass::To, r"^(?i:to)"),
        make_rule(TokenClass::End, r"^(?i:end)"),
        make_rule(TokenClass::True, r"^(?i:true)"),
        make_rule(TokenClass::False, r"^(?i:false)"),
        make_rule(TokenClass::Nil, r"^(?i:nil)"),
        make_rule(TokenClass::Number, r"^[0-9]+(\.[0-9]+)?"),
        make_rule(TokenClass::Symbol, r"^[A-Za-z_?.][A-Za-z0-9_?.!]*"),
        make_rule(TokenClass::Quote, r#"^"[^\s\[\]()]*"#),
        make_rule(TokenClass::Reference, r"^:[^\s\[\]()+\-*/=<>!]+"),
        make_rule(TokenClass::LeftBracket, r"^\["),
        make_rule(TokenClass::RightBracket, r"^\]"),
        make_rule(TokenClass::LeftParen, r"^\("),
        make_rule(TokenClass::RightParen, r"^\)"),
        make_rule(TokenClass::Plus, r"^\+"),
        make_rule(TokenClass::Minus, r"^-"),
        make_rule(TokenClass::Star, r"^\*"),
        make_rule(TokenClass::Slash, r"^/"),
        make_rule(TokenClass::EqualEqual, r"^=="),
        make_rule(TokenClass::Equal, r"^="),
        make_rule(TokenClass::BangEqual, r"^!="),
        make_rule(TokenClass::LessEqual, r"^<="),
        make_rule(TokenClass::GreaterEqual, r"^>="),
        make_rule(TokenClass::Less, r"^<"),
        make_rule(TokenClass::Greater, r"^>"),
        make_rule(TokenClass::Newline, r"^\r?\n"),
        make_rule(TokenClass::Comment, r"^;[^\n]*"),
        make_rule(TokenClass::Whitespace, r"^[ \t\r]+"),
        make_rule(TokenClass::Error, r"^."),
    ];

    // Inside brackets every word is kept verbatim as a symbol.
    static ref list_token_rules: Vec<TokenRule> = vec![
        make_rule(TokenClass::LeftBracket, r"^\["),
        make_rule(TokenClass::RightBracket, r"^\]"),
        make_rule(TokenClass::Whitespace, r"^\s+"),
        make_rule(TokenClass::Symbol, r"^[^\s\[\]]+"),
    ];
}

// Gets the rule for a specific token class.
fn get_rule_for_token_class(token_class: TokenClass) -> Option<&'static TokenRule> {
    token_rules
        .iter()
        .find(|token_rule| token_rule.token_class == token_class)
}

// Finds the rule that matches the most characters from the start of the input
// string.
fn get_longest_matching_rule(
    rules: &'static [TokenRule],
    input_str: &str,
) -> (&'static TokenRule, usize) {
    let mut longest_match_len: usize = 0;
    let mut longest_token_rule = get_rule_for_token_class(TokenClass::Error)
        .expect("Unable to find token rule for Error token class.");

    for token_rule in rules.iter() {
        match token_rule.regex.find(input_str) {
            None => continue,
            Some(match_obj) => {
                if match_obj.len() > longest_match_len {
                    longest_match_len = match_obj.len();
                    longest_token_rule = token_rule;
                }
            }
        };
    }

    // The Error rule always consumes at least one character, so the lexer
    // never stalls. Multi-byte characters are consumed whole.
    if longest_match_len == 0 {
        longest_match_len = input_str.chars().next().map_or(1, |c| c.len_utf8());
    }

    (longest_token_rule, longest_match_len)
}

// Given a string, returns a vector of tokens that comprise that string,
// without the trailing Eof token.
fn make_token_stream(program_str: &str) -> Vec<Token> {
    let mut curr_idx: usize = 0;
    let mut line_num: usize = 1;
    let mut line_start_idx: usize = 0;
    let mut list_depth: usize = 0;
    let mut out = Vec::new();

    while curr_idx < program_str.len() {
        let rules: &'static [TokenRule] = match list_depth {
            0 => &token_rules,
            _ => &list_token_rules,
        };
        let (token_rule, match_len) = get_longest_matching_rule(rules, &program_str[curr_idx..]);
        let token_text = &program_str[curr_idx..curr_idx + match_len];

        match token_rule.token_class {
            TokenClass::LeftBracket => list_depth += 1,
            TokenClass::RightBracket => list_depth = list_depth.saturating_sub(1),
            _ => {}
        }

        out.push(Token {
            token_class: token_rule.token_class,
            token_text: String::from(token_text),
            line_num,
            col_num: curr_idx - line_start_idx,
        });

        // Keep line bookkeeping in sync with every newline consumed, including
        // the ones swallowed by list-mode whitespace.
        for (offset, c) in token_text.char_indices() {
            if c == '\n' {
                line_num += 1;
                line_start_idx = curr_idx + offset + 1;
            }
        }

        curr_idx += match_len;
    }

    out
}

/// Runs the lexer on `program_str` and appends an `Eof` token. When
/// `discard_uninteresting` is set, whitespace and comments are dropped.
/// Newlines are always kept since they terminate procedure headers.
pub fn run_lexical_analysis(program_str: &str, discard_uninteresting: bool) -> Vec<Token> {
    let mut tokens: Vec<Token> = make_token_stream(program_str)
        .into_iter()
        .filter(|token| {
            !discard_uninteresting
                || !matches!(
                    token.token_class,
                    TokenClass::Whitespace | TokenClass::Comment
                )
        })
        .collect();

    let (line_num, col_num) = match tokens.last() {
        Some(last) => (last.line_num, last.col_num + last.token_text.len()),
        None => (1, 0),
    };

    tokens.push(Token {
        token_class: TokenClass::Eof,
        token_text: String::new(),
        line_num,
        col_num,
    });

    tokens
}
