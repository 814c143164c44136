//! Lexer and recursive-descent evaluator for arithmetic expressions.
//!
//! Only a fixed whitelist of lexemes is accepted. Nothing here can run
//! arbitrary code: the grammar has no variables, no assignment and no
//! calls outside the function table below.

/// Maximum nesting of parentheses and unary signs.
pub const MAX_DEPTH: usize = 64;

/// Why an expression was not evaluated. Never leaves the math module.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EvalError {
    Syntax,
    UnknownName(String),
    DivisionByZero,
    NonFinite,
    TooDeep,
    NoOperation,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    LParen,
    RParen,
    Name(String),
}

const CONSTANTS: &[(&str, f64)] = &[
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
];

const FUNCTIONS: &[&str] = &["sqrt", "abs", "sin", "cos", "tan", "ln", "log", "exp"];

/// Evaluate `input`, which must already be stripped of any preamble.
pub(crate) fn evaluate(input: &str, named: bool) -> Result<f64, EvalError> {
    let tokens = tokenize(input, named)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operations: 0,
    };

    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::Syntax);
    }
    if parser.operations == 0 {
        return Err(EvalError::NoOperation);
    }
    Ok(value)
}

fn tokenize(input: &str, named: bool) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let (value, next) = read_number(&chars, i)?;
                tokens.push(Token::Num(value));
                i = next;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Op('^'));
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '×' => {
                tokens.push(Token::Op('*'));
                i += 1;
            }
            '÷' => {
                tokens.push(Token::Op('/'));
                i += 1;
            }
            '−' => {
                tokens.push(Token::Op('-'));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();
                let known = CONSTANTS.iter().any(|(n, _)| *n == name) || FUNCTIONS.contains(&name.as_str());
                if !named || !known {
                    return Err(EvalError::UnknownName(name));
                }
                tokens.push(Token::Name(name));
            }
            _ => return Err(EvalError::Syntax),
        }
    }

    Ok(tokens)
}

/// Read `digits [. digits] [(e|E) [+|-] digits]` starting at `start`.
fn read_number(chars: &[char], start: usize) -> Result<(f64, usize), EvalError> {
    let mut i = start;
    let mut seen_digit = false;
    let mut seen_dot = false;

    while i < chars.len() {
        match chars[i] {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }
    if !seen_digit {
        return Err(EvalError::Syntax);
    }

    // Exponent only when digits follow, so "2e" stays a number and a name.
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    let literal: String = chars[start..i].iter().collect();
    let value: f64 = literal.parse().map_err(|_| EvalError::Syntax)?;
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok((value, i))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operations: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = apply(op, value, rhs)?;
            self.operations += 1;
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = apply(op, value, rhs)?;
            self.operations += 1;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Op(op @ ('+' | '-'))) => {
                let negate = *op == '-';
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(if negate { -value } else { value })
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            self.operations += 1;
            return apply('^', base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::LParen) => self.parenthesized(),
            Some(Token::Name(name)) => {
                if let Some((_, value)) = CONSTANTS.iter().find(|(n, _)| *n == name) {
                    return Ok(*value);
                }
                if self.next() != Some(Token::LParen) {
                    return Err(EvalError::Syntax);
                }
                let arg = self.parenthesized()?;
                self.operations += 1;
                call(&name, arg)
            }
            _ => Err(EvalError::Syntax),
        }
    }

    /// Parse `expr )` after an opening parenthesis has been consumed.
    fn parenthesized(&mut self) -> Result<f64, EvalError> {
        self.descend()?;
        let value = self.expr()?;
        if self.next() != Some(Token::RParen) {
            return Err(EvalError::Syntax);
        }
        self.depth -= 1;
        Ok(value)
    }
}

fn apply(op: char, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let value = match op {
        '+' => lhs + rhs,
        '-' => lhs - rhs,
        '*' => lhs * rhs,
        '/' => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        '%' => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            // Floored modulo: the result takes the sign of the divisor.
            let r = lhs % rhs;
            if r != 0.0 && (r < 0.0) != (rhs < 0.0) { r + rhs } else { r }
        }
        '^' => lhs.powf(rhs),
        _ => return Err(EvalError::Syntax),
    };
    finite(value)
}

fn call(name: &str, arg: f64) -> Result<f64, EvalError> {
    let value = match name {
        "sqrt" => arg.sqrt(),
        "abs" => arg.abs(),
        "sin" => arg.sin(),
        "cos" => arg.cos(),
        "tan" => arg.tan(),
        "ln" => arg.ln(),
        "log" => arg.log10(),
        "exp" => arg.exp(),
        other => return Err(EvalError::UnknownName(other.to_string())),
    };
    finite(value)
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() { Ok(value) } else { Err(EvalError::NonFinite) }
}
