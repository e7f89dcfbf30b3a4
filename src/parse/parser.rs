use super::grammar::{test_expression, value_expression, Cursor};
use super::scanner::Scanner;
use crate::{
    BinaryOp, CompileError, Fact, Node, Operator, Scheme, SchemeOptions, Syntax, Term, TokenKind,
};

/// Directive keywords. Only `if` is rewritten; the others are reserved and
/// copied through.
const KEYWORDS: [&str; 3] = ["if", "match", "token"];

/// Rewrites `if(test, consequent[, alternate])` directives into
/// custom-property references and records the conditions they need.
///
/// A parser owns one [`Scanner`] and can be reused for any number of
/// sources.
///
/// # Example
///
/// ```
/// use condstyle::{Parser, Scheme};
///
/// let mut scheme = Scheme::new("button");
/// let mut parser = Parser::new();
/// let css = parser
///     .parse("color: if(size == 'large', red, blue);", &mut scheme)
///     .unwrap();
/// assert_eq!(css, "color: var(--size≡´large´,red) var(--size≠´large´,blue);");
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    scanner: Scanner,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite every top-level directive in `source`, registering the
    /// conditions it uses with `scheme`.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] met; no partial output is
    /// produced.
    #[tracing::instrument(level = "debug", skip_all, fields(scheme = %scheme.name(), bytes = source.len()))]
    pub fn parse(&mut self, source: &str, scheme: &mut Scheme) -> Result<String, CompileError> {
        self.scanner.reset(source);
        let mut session = Session { scheme };
        let mut out = String::with_capacity(source.len());
        loop {
            let (text, stop) = self.scanner.scan_until_any(&KEYWORDS);
            out.push_str(&text);
            if stop.is_none() {
                return Ok(out);
            }
            out.push_str(&session.directive(&mut self.scanner)?);
        }
    }

    /// Parse a standalone test expression.
    ///
    /// # Errors
    ///
    /// Fails on any syntax or term-construction error, or if input remains
    /// after the expression.
    pub fn parse_test(&mut self, source: &str) -> Result<Term, CompileError> {
        self.scanner.reset(source);
        let mut cursor = Cursor::start(&mut self.scanner)?;
        let term = test_expression(&mut cursor, &mut self.scanner, 0)?;
        cursor.finish()?;
        Ok(term)
    }

    /// Parse a structured value: a literal, array, object, member access or
    /// call.
    ///
    /// # Errors
    ///
    /// Fails on any syntax error, or if input remains after the value.
    pub fn parse_value(&mut self, source: &str) -> Result<Syntax, CompileError> {
        self.scanner.reset(source);
        let mut cursor = Cursor::start(&mut self.scanner)?;
        let value = value_expression(&mut cursor, &mut self.scanner)?;
        cursor.finish()?;
        Ok(value)
    }
}

/// State of one `parse` call.
struct Session<'a> {
    scheme: &'a mut Scheme,
}

impl Session<'_> {
    /// Rewrite the directive starting at the scanner position and leave the
    /// scanner after it.
    fn directive(&mut self, scanner: &mut Scanner) -> Result<String, CompileError> {
        let mut cursor = Cursor::start(scanner)?;
        let keyword = cursor.eat_last(TokenKind::Identifier)?;
        if keyword.text != "if" {
            return Ok(keyword.text);
        }

        cursor.refill(scanner)?;
        cursor.eat(scanner, TokenKind::Op(Operator::LParen))?;
        let test = test_expression(&mut cursor, scanner, 0)?;
        // Bodies are raw text: the scanner must stay right after the comma.
        cursor.eat_last(TokenKind::Op(Operator::Comma))?;

        let (consequent, stop) = self.body(scanner, &[",", ")"])?;
        let alternate = if stop == "," {
            Some(self.body(scanner, &[")"])?.0)
        } else {
            None
        };
        self.if_serialize(test, consequent.trim(), alternate.as_deref().map(str::trim))
    }

    /// Scan a body up to one of `stops`, rewriting nested directives, and
    /// consume the stop.
    fn body(
        &mut self,
        scanner: &mut Scanner,
        stops: &[&'static str],
    ) -> Result<(String, &'static str), CompileError> {
        let (text, stop) =
            scanner.scan_until_balanced(stops, &KEYWORDS, |scanner, _| self.directive(scanner))?;
        let stop = stop.ok_or_else(|| CompileError::UnexpectedEnd {
            expected: ")".to_owned(),
        })?;
        scanner.next_token()?;
        Ok((text, stop))
    }

    fn register(&mut self, term: &Term) {
        for fact in Fact::collect(term) {
            self.scheme.add_condition(fact);
        }
    }

    fn if_serialize(
        &mut self,
        mut test: Term,
        consequent: &str,
        alternate: Option<&str>,
    ) -> Result<String, CompileError> {
        if let Some(truth) = test.to_boolean() {
            let folded = if truth {
                consequent
            } else {
                alternate.unwrap_or("")
            };
            return Ok(folded.to_owned());
        }

        test.to_nnf();
        let out = if test.op().is_some_and(BinaryOp::is_junction) {
            self.compound(test, consequent, alternate)
        } else {
            self.simple(test, consequent, alternate)?
        };
        tracing::trace!(%out, "rewrote directive");
        Ok(out)
    }

    /// `||`/`&&` tests become prepared `if-`/`else-` conditions.
    fn compound(&mut self, test: Term, consequent: &str, alternate: Option<&str>) -> String {
        let name = test.name();

        let mut positive = test.clone();
        positive.to_dnf(true);
        self.register(&positive);
        let value = conjoin(&positive, None, self.scheme.options());
        self.scheme.add_prepared_condition(format!("if-{name}"), value);
        let mut out = format!("var(--if-{name},{consequent})");

        if let Some(alternate) = alternate {
            let mut negative = !test;
            negative.to_nnf().to_dnf(true);
            self.register(&negative);
            let value = conjoin(&negative, None, self.scheme.options());
            self.scheme.add_prepared_condition(format!("else-{name}"), value);
            out.push_str(&format!(" var(--else-{name},{alternate})"));
        }
        out
    }

    /// Single identifiers and comparisons reference their own flags.
    fn simple(
        &mut self,
        test: Term,
        consequent: &str,
        alternate: Option<&str>,
    ) -> Result<String, CompileError> {
        let fact = Fact::from_term(&test)
            .ok_or_else(|| CompileError::malformed(&test, "expected a condition"))?;
        let mut out = format!("var(--{},{consequent})", fact.name());
        self.scheme.add_condition(fact);

        if let Some(alternate) = alternate {
            let mut negative = !test;
            negative.to_nnf();
            let fact = Fact::from_term(&negative)
                .ok_or_else(|| CompileError::malformed(&negative, "expected a condition"))?;
            out.push_str(&format!(" var(--{},{alternate})", fact.name()));
            self.scheme.add_condition(fact);
        }
        Ok(out)
    }
}

/// The custom-property value of a normalized term. `||` concatenates its
/// operands; `&&` nests them as `var()` fallbacks, so the value is `on`
/// only when every flag in the chain is.
fn conjoin(term: &Term, tail: Option<&str>, options: &SchemeOptions) -> String {
    match term.node() {
        Node::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } if !term.is_negated() => format!(
            "{} {}",
            conjoin(left, tail, options),
            conjoin(right, tail, options)
        ),
        Node::Binary {
            op: BinaryOp::And,
            left,
            right,
        } if !term.is_negated() => {
            let inner = conjoin(right, tail, options);
            conjoin(left, Some(&inner), options)
        }
        Node::Literal(lit) => {
            if lit.is_truthy() {
                tail.unwrap_or(&options.on).to_owned()
            } else {
                options.off.clone()
            }
        }
        _ => match tail {
            Some(tail) => format!("var(--{},{tail})", term.name()),
            None => format!("var(--{})", term.name()),
        },
    }
}
