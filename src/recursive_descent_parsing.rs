//! Arity-directed recursive descent parser. Turns a token vector into a list
//! of statements, consulting the live procedure table to decide how many
//! expressions each call consumes.

use std::fmt::Display;
use std::rc::Rc;

use crate::lexical_analysis::{run_lexical_analysis, Token, TokenClass};
use crate::procedure_table::ProcedureTable;
use crate::program_representation::{Call, Node, Procedure, ProcedureBody};

/// Represents a parsing error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    UnexpectedTokenClass {
        expected_token_class: TokenClass,
        found_token_class: TokenClass,
        line_num: usize,
        col_num: usize,
    },
    UnexpectedToken {
        found_token_class: TokenClass,
        found_token_text: String,
        line_num: usize,
        col_num: usize,
    },
    UnterminatedProcedureBody {
        procedure_name: String,
        line_num: usize,
    },
    ProcedureNotFound {
        procedure_name: String,
    },
}

/// Display trait implementation for ParseError.
impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTokenClass {
                expected_token_class,
                found_token_class,
                line_num,
                col_num,
            } => {
                return write!(
                    f,
                    "Unexpected token class at line {}, column {}. Expected: {:?}, found: {:?}.",
                    line_num, col_num, expected_token_class, found_token_class
                );
            }

            Self::UnexpectedToken {
                found_token_class,
                found_token_text,
                line_num,
                col_num,
            } => {
                return write!(
                    f,
                    "Unexpected token {:?} ({:?}) at line {}, column {}.",
                    found_token_text, found_token_class, line_num, col_num
                );
            }

            Self::UnterminatedProcedureBody {
                procedure_name,
                line_num,
            } => {
                return write!(
                    f,
                    "Procedure {} defined at line {} is missing its closing end.",
                    procedure_name, line_num
                );
            }

            Self::ProcedureNotFound { procedure_name } => {
                return write!(f, "I don't know how to {}", procedure_name);
            }
        }
    }
}

// Infix operators grouped by precedence level, loosest first, with the
// builtin each one desugars to.
const EQUALITY_OPERATORS: [(TokenClass, &str); 3] = [
    (TokenClass::Equal, "equal?"),
    (TokenClass::EqualEqual, "equal?"),
    (TokenClass::BangEqual, "notequal?"),
];

const COMPARISON_OPERATORS: [(TokenClass, &str); 4] = [
    (TokenClass::Less, "less?"),
    (TokenClass::Greater, "greater?"),
    (TokenClass::LessEqual, "lessequal?"),
    (TokenClass::GreaterEqual, "greaterequal?"),
];

const ADDITIVE_OPERATORS: [(TokenClass, &str); 2] =
    [(TokenClass::Plus, "add"), (TokenClass::Minus, "sub")];

const MULTIPLICATIVE_OPERATORS: [(TokenClass, &str); 2] =
    [(TokenClass::Star, "mul"), (TokenClass::Slash, "div")];

type ParseResult = Result<(Node, usize), ParseError>;

/// Tries to parse a token of the requested class at tokens[start_idx].
fn try_token_class(
    tokens: &Vec<Token>,
    start_idx: usize,
    token_class: TokenClass,
) -> Result<(&Token, usize), ParseError> {
    let token = token_at(tokens, start_idx);

    match token.token_class == token_class {
        true => return Ok((token, start_idx + 1)),
        false => {
            return Err(ParseError::UnexpectedTokenClass {
                expected_token_class: token_class,
                found_token_class: token.token_class,
                line_num: token.line_num,
                col_num: token.col_num,
            })
        }
    };
}

// The token at `idx`, or the trailing Eof when reading past the end.
fn token_at(tokens: &Vec<Token>, idx: usize) -> &Token {
    assert!(!tokens.is_empty(), "token stream must end with Eof");
    return &tokens[idx.min(tokens.len() - 1)];
}

fn unexpected_token(token: &Token) -> ParseError {
    return ParseError::UnexpectedToken {
        found_token_class: token.token_class,
        found_token_text: token.token_text.clone(),
        line_num: token.line_num,
        col_num: token.col_num,
    };
}

fn parse_number(token: &Token, negate: bool) -> Result<Node, ParseError> {
    let text = match negate {
        true => format!("-{}", token.token_text),
        false => token.token_text.clone(),
    };

    if !text.contains('.') {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Node::Integer(value));
        }
    }

    match text.parse::<f64>() {
        Ok(value) => return Ok(Node::Float(value)),
        Err(_) => return Err(unexpected_token(token)),
    }
}

// Rebuilds readable source text for a procedure definition from its tokens.
fn tokens_to_source(tokens: &[Token]) -> String {
    let mut out = String::new();

    for token in tokens {
        if token.token_class == TokenClass::Newline {
            out.push('\n');
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        out.push_str(token.token_text.as_str());
    }

    return out;
}

/// Reads one token vector against a procedure table. The table is updated
/// with every procedure header, alias and completed definition seen.
pub struct Reader<'a> {
    tokens: &'a Vec<Token>,
    procedures: &'a mut ProcedureTable,
}

impl<'a> Reader<'a> {
    pub fn new(tokens: &'a Vec<Token>, procedures: &'a mut ProcedureTable) -> Reader<'a> {
        Reader { tokens, procedures }
    }

    /// Registers every `to name :p1 :p2` header so that forward and
    /// recursive references parse with the right arity.
    fn run_header_pass(&mut self) -> Result<(), ParseError> {
        let mut idx = 0;

        while idx < self.tokens.len() {
            if self.tokens[idx].token_class != TokenClass::To {
                idx += 1;
                continue;
            }

            let line_num = self.tokens[idx].line_num;
            let (name_token, mut next_idx) =
                try_token_class(self.tokens, idx + 1, TokenClass::Symbol)?;

            let mut params = Vec::new();
            while token_at(self.tokens, next_idx).token_class == TokenClass::Reference {
                params.push(String::from(&token_at(self.tokens, next_idx).token_text[1..]));
                next_idx += 1;
            }

            tracing::debug!(
                procedure = %name_token.token_text,
                arity = params.len(),
                "header pass registered procedure"
            );
            self.procedures.define(Procedure::user_defined(
                name_token.token_text.as_str(),
                params,
                line_num,
            ));

            idx = next_idx;
        }

        return Ok(());
    }

    /// Applies every `alias "original "alias` directive ahead of the main pass.
    fn run_alias_pass(&mut self) -> Result<(), ParseError> {
        let mut idx = 0;

        while idx + 2 < self.tokens.len() {
            let is_alias = self.tokens[idx].token_class == TokenClass::Symbol
                && self.tokens[idx].token_text.eq_ignore_ascii_case("alias")
                && self.tokens[idx + 1].token_class == TokenClass::Quote
                && self.tokens[idx + 2].token_class == TokenClass::Quote;

            if !is_alias {
                idx += 1;
                continue;
            }

            let original = &self.tokens[idx + 1].token_text[1..];
            let alias = &self.tokens[idx + 2].token_text[1..];

            tracing::debug!(original, alias, "alias pass");
            self.procedures
                .alias(original, alias)
                .map_err(|not_found| ParseError::ProcedureNotFound {
                    procedure_name: not_found.procedure_name,
                })?;

            idx += 3;
        }

        return Ok(());
    }

    /// Tries to parse a binary operator level: `operand (op operand)*`,
    /// folding to the left.
    fn try_binary_rule(
        &mut self,
        start_idx: usize,
        operators: &[(TokenClass, &str)],
        operand_rule: fn(&mut Self, usize) -> ParseResult,
    ) -> ParseResult {
        let (mut out_node, mut start_idx) = operand_rule(self, start_idx)?;

        loop {
            let token = token_at(self.tokens, start_idx);
            let operator = operators
                .iter()
                .find(|(token_class, _)| *token_class == token.token_class);

            let procedure_name = match operator {
                Some((_, procedure_name)) => *procedure_name,
                None => break,
            };

            // `f :x -1` passes a negative literal rather than subtracting.
            if self.is_negative_literal(start_idx) {
                break;
            }

            let (right_node, new_start_idx) = operand_rule(self, start_idx + 1)?;
            out_node = Node::Call(Call::new(procedure_name, 2, vec![out_node, right_node]));
            start_idx = new_start_idx;
        }

        return Ok((out_node, start_idx));
    }

    fn try_expr_rule(&mut self, start_idx: usize) -> ParseResult {
        return self.try_binary_rule(start_idx, &EQUALITY_OPERATORS, Self::try_comparison_rule);
    }

    fn try_comparison_rule(&mut self, start_idx: usize) -> ParseResult {
        return self.try_binary_rule(start_idx, &COMPARISON_OPERATORS, Self::try_additive_rule);
    }

    fn try_additive_rule(&mut self, start_idx: usize) -> ParseResult {
        return self.try_binary_rule(
            start_idx,
            &ADDITIVE_OPERATORS,
            Self::try_multiplicative_rule,
        );
    }

    fn try_multiplicative_rule(&mut self, start_idx: usize) -> ParseResult {
        return self.try_binary_rule(start_idx, &MULTIPLICATIVE_OPERATORS, Self::try_primary_rule);
    }

    // A minus sign glued to the number after it but separated from the token
    // before it.
    fn is_negative_literal(&self, idx: usize) -> bool {
        let minus = token_at(self.tokens, idx);
        let next = token_at(self.tokens, idx + 1);

        if minus.token_class != TokenClass::Minus || next.token_class != TokenClass::Number {
            return false;
        }
        if next.line_num != minus.line_num || next.col_num != minus.col_num + 1 {
            return false;
        }
        if idx == 0 {
            return true;
        }

        let prev = &self.tokens[idx - 1];
        return prev.line_num != minus.line_num
            || prev.col_num + prev.token_text.len() < minus.col_num;
    }

    /// Tries to parse according to the production
    /// `primary -> literal | -number | call | word | list | ( ... )`.
    fn try_primary_rule(&mut self, start_idx: usize) -> ParseResult {
        let token = token_at(self.tokens, start_idx);

        match token.token_class {
            TokenClass::True => return Ok((Node::Boolean(true), start_idx + 1)),
            TokenClass::False => return Ok((Node::Boolean(false), start_idx + 1)),
            TokenClass::Nil => return Ok((Node::Nil, start_idx + 1)),
            TokenClass::Number => return Ok((parse_number(token, false)?, start_idx + 1)),

            TokenClass::Minus => {
                let (number_token, start_idx) =
                    try_token_class(self.tokens, start_idx + 1, TokenClass::Number)?;
                return Ok((parse_number(number_token, true)?, start_idx));
            }

            TokenClass::Quote => {
                return Ok((Node::Quoted(String::from(&token.token_text[1..])), start_idx + 1));
            }

            TokenClass::Reference => {
                return Ok((
                    Node::Reference(String::from(&token.token_text[1..])),
                    start_idx + 1,
                ));
            }

            TokenClass::Symbol => match self.procedures.defined(token.token_text.as_str()) {
                true => return self.try_call_rule(start_idx),
                false => return Ok((Node::Symbol(token.token_text.clone()), start_idx + 1)),
            },

            TokenClass::LeftBracket => return self.try_list_rule(start_idx),
            TokenClass::LeftParen => return self.try_parenthesis_rule(start_idx),

            _ => return Err(unexpected_token(token)),
        }
    }

    /// Tries to parse a call in prefix form, consuming exactly as many
    /// argument expressions as the callee's declared arity.
    fn try_call_rule(&mut self, start_idx: usize) -> ParseResult {
        let (name_token, mut start_idx) =
            try_token_class(self.tokens, start_idx, TokenClass::Symbol)?;
        let arity = self
            .procedures
            .arity_of(name_token.token_text.as_str())
            .ok_or_else(|| ParseError::ProcedureNotFound {
                procedure_name: name_token.token_text.clone(),
            })?;

        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            let (arg, new_start_idx) = self.try_expr_rule(start_idx)?;
            args.push(arg);
            start_idx = new_start_idx;
        }

        return Ok((
            Node::Call(Call::new(name_token.token_text.as_str(), arity, args)),
            start_idx,
        ));
    }

    /// Tries to parse `( name expr* )` as a variadic call, or `( expr )` as a
    /// grouped expression.
    fn try_parenthesis_rule(&mut self, start_idx: usize) -> ParseResult {
        let (_, start_idx) = try_token_class(self.tokens, start_idx, TokenClass::LeftParen)?;
        let head = token_at(self.tokens, start_idx);

        if head.token_class != TokenClass::Symbol || !self.procedures.defined(&head.token_text) {
            let (expr_node, start_idx) = self.try_expr_rule(start_idx)?;
            let (_, start_idx) = try_token_class(self.tokens, start_idx, TokenClass::RightParen)?;
            return Ok((expr_node, start_idx));
        }

        let name = head.token_text.clone();
        let arity = self.procedures.arity_of(name.as_str()).unwrap_or(0);
        let mut start_idx = start_idx + 1;
        let mut args = Vec::new();

        loop {
            match token_at(self.tokens, start_idx).token_class {
                TokenClass::Newline => start_idx += 1,
                TokenClass::RightParen | TokenClass::Eof => break,
                _ => {
                    let (arg, new_start_idx) = self.try_expr_rule(start_idx)?;
                    args.push(arg);
                    start_idx = new_start_idx;
                }
            }
        }

        let (_, start_idx) = try_token_class(self.tokens, start_idx, TokenClass::RightParen)?;

        let mut call = Call::new(name.as_str(), arity, args);
        call.parenthesized = true;
        return Ok((Node::Call(call), start_idx));
    }

    /// Tries to parse a bracketed list. Children are kept as raw words.
    fn try_list_rule(&mut self, start_idx: usize) -> ParseResult {
        let (_, mut start_idx) = try_token_class(self.tokens, start_idx, TokenClass::LeftBracket)?;
        let mut children = Vec::new();

        loop {
            let token = token_at(self.tokens, start_idx);

            match token.token_class {
                TokenClass::RightBracket => {
                    start_idx += 1;
                    break;
                }

                TokenClass::LeftBracket => {
                    let (child, new_start_idx) = self.try_list_rule(start_idx)?;
                    children.push(child);
                    start_idx = new_start_idx;
                }

                TokenClass::Newline | TokenClass::Whitespace | TokenClass::Comment => {
                    start_idx += 1;
                }

                TokenClass::Eof => {
                    return Err(ParseError::UnexpectedTokenClass {
                        expected_token_class: TokenClass::RightBracket,
                        found_token_class: TokenClass::Eof,
                        line_num: token.line_num,
                        col_num: token.col_num,
                    });
                }

                _ => {
                    children.push(Node::Symbol(token.token_text.clone()));
                    start_idx += 1;
                }
            }
        }

        return Ok((Node::List(children), start_idx));
    }

    /// Tries to parse a `to ... end` definition. The completed procedure
    /// replaces the header-only entry in the table.
    fn try_procedure_definition_rule(&mut self, start_idx: usize) -> ParseResult {
        let (to_token, idx) = try_token_class(self.tokens, start_idx, TokenClass::To)?;
        let (name_token, mut idx) = try_token_class(self.tokens, idx, TokenClass::Symbol)?;
        let name = name_token.token_text.to_lowercase();
        let line_num = to_token.line_num;

        let mut params = Vec::new();
        while token_at(self.tokens, idx).token_class == TokenClass::Reference {
            params.push(String::from(&token_at(self.tokens, idx).token_text[1..]));
            idx += 1;
        }

        if token_at(self.tokens, idx).token_class == TokenClass::Eof {
            return Err(ParseError::UnterminatedProcedureBody {
                procedure_name: name,
                line_num,
            });
        }
        let (_, mut idx) = try_token_class(self.tokens, idx, TokenClass::Newline)?;

        self.procedures.define(Procedure::user_defined(
            name.as_str(),
            params.clone(),
            line_num,
        ));

        let mut body = Vec::new();
        loop {
            match token_at(self.tokens, idx).token_class {
                TokenClass::End => {
                    idx += 1;
                    break;
                }

                TokenClass::Eof => {
                    return Err(ParseError::UnterminatedProcedureBody {
                        procedure_name: name,
                        line_num,
                    });
                }

                _ => {
                    let (statement, new_idx) = self.try_statement_rule(idx)?;
                    idx = new_idx;
                    match statement {
                        Node::None | Node::Procedure(_) => {}
                        other => body.push(other),
                    }
                }
            }
        }

        let procedure = Procedure {
            name: name.clone(),
            params,
            body: ProcedureBody::UserDefined(Rc::new(body)),
            source: Some(tokens_to_source(&self.tokens[start_idx..idx])),
            line_num: Some(line_num),
        };

        tracing::debug!(procedure = %name, line = line_num, "parsed procedure definition");
        self.procedures.define(procedure.clone());

        return Ok((Node::Procedure(Rc::new(procedure)), idx));
    }

    /// Tries to parse one statement: a blank line (returned as `none`), a
    /// procedure definition, or an expression.
    fn try_statement_rule(&mut self, start_idx: usize) -> ParseResult {
        match token_at(self.tokens, start_idx).token_class {
            TokenClass::Newline => return Ok((Node::None, start_idx + 1)),
            TokenClass::To => return self.try_procedure_definition_rule(start_idx),
            _ => return self.try_expr_rule(start_idx),
        }
    }

    /// Runs the header pass, the alias pass and then the main pass. The
    /// result holds every top-level statement in order; procedure
    /// definitions are included only when `keep_definitions` is set.
    pub fn parse(&mut self, keep_definitions: bool) -> Result<Vec<Node>, ParseError> {
        self.run_header_pass()?;
        self.run_alias_pass()?;

        let mut statements = Vec::new();
        let mut start_idx = 0;

        while token_at(self.tokens, start_idx).token_class != TokenClass::Eof {
            let (statement, new_start_idx) = self.try_statement_rule(start_idx)?;
            start_idx = new_start_idx;

            match statement {
                Node::None => {}
                Node::Procedure(_) if !keep_definitions => {}
                other => statements.push(other),
            }
        }

        return Ok(statements);
    }

    /// Reads a whole program into a `List` of top-level statements.
    pub fn read(&mut self) -> Result<Node, ParseError> {
        return Ok(Node::List(self.parse(false)?));
    }
}

/// Uses recursive descent to parse the given vector of tokens into a `List`
/// of statements, registering procedures into `procedures` on the way.
///
/// Assumes that the input token vector has discarded whitespace and comments
/// (i.e. it was produced via run_lexical_analysis with
/// `discard_uninteresting = true`).
pub fn parse_recursive_descent(
    tokens: &Vec<Token>,
    procedures: &mut ProcedureTable,
) -> Result<Node, ParseError> {
    return Reader::new(tokens, procedures).read();
}

/// Reads a line of text as the contents of a list literal, the way
/// `readlist` sees user input.
pub fn read_list_literal(text: &str) -> Result<Node, ParseError> {
    let tokens = run_lexical_analysis(format!("[{}]", text).as_str(), true);
    let mut scratch = ProcedureTable::new();
    let (list, _) = Reader::new(&tokens, &mut scratch).try_list_rule(0)?;

    return Ok(list);
}
