use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use chumsky::prelude::*;
use tracing::{debug, instrument};
use variantly::Variantly;

pub type Spanned<T> = (T, SimpleSpan);

#[derive(Clone, Debug, PartialEq, Eq, Variantly)]
pub enum Operand {
    Number(u32),
    Label(String),
}

impl Operand {
    /// Decimal, `0x` hex, `0b` binary (either case), or a label name
    fn parse(word: &str) -> Option<Self> {
        let first = word.chars().next()?;
        if !first.is_ascii_digit() {
            return Some(Operand::Label(word.to_string()));
        }
        let prefixed = |prefixes: [&'static str; 2]| {
            prefixes
                .into_iter()
                .find_map(|prefix| word.strip_prefix(prefix))
        };
        let number = if let Some(hex) = prefixed(["0x", "0X"]) {
            u32::from_str_radix(hex, 16)
        } else if let Some(bin) = prefixed(["0b", "0B"]) {
            u32::from_str_radix(bin, 2)
        } else {
            word.parse()
        };
        number.ok().map(Operand::Number)
    }
}

/// One line of track assembly
#[derive(Clone, Debug, PartialEq, Eq, Variantly)]
pub enum Statement {
    /// `name:`
    Label(String),
    /// `mnemonic operand, ...`
    Op(String, Vec<Operand>),
    /// `db 1, 2, 0x03`
    Data(Vec<Operand>),
}

/// One statement per line, after any number of `label:`s
fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Spanned<Statement>>, extra::Err<Rich<'a, char>>> {
    let inline_ws = one_of(" \t").repeated();
    let comment = just(';').then(none_of("\n").repeated()).ignored();

    let word = any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .collect::<String>();

    let ident = word
        .clone()
        .filter(|word: &String| word.starts_with(|c: char| !c.is_ascii_digit()));

    let operand = word.try_map(|word: String, span| {
        Operand::parse(&word).ok_or_else(|| Rich::custom(span, format!("invalid number `{word}`")))
    });
    let operands = operand
        .separated_by(just(',').padded_by(inline_ws.clone()))
        .at_least(1)
        .collect::<Vec<_>>();

    let label = ident
        .clone()
        .then_ignore(just(':'))
        .map(Statement::Label)
        .map_with(|statement, e| (statement, e.span()));

    let instruction = ident
        .then(inline_ws.clone().at_least(1).ignore_then(operands).or_not())
        .map(|(mnemonic, operands)| {
            let operands = operands.unwrap_or_default();
            if mnemonic.eq_ignore_ascii_case("db") {
                Statement::Data(operands)
            } else {
                Statement::Op(mnemonic, operands)
            }
        })
        .map_with(|statement, e| (statement, e.span()));

    let line = inline_ws
        .clone()
        .ignore_then(
            label
                .then_ignore(inline_ws.clone())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(instruction.or_not())
        .then_ignore(inline_ws)
        .then_ignore(comment.or_not())
        .map(|(mut statements, instruction)| {
            statements.extend(instruction);
            statements
        });

    line.separated_by(text::newline())
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|lines: Vec<Vec<Spanned<Statement>>>| lines.into_iter().flatten().collect::<Vec<_>>())
}

#[instrument(skip(src))]
pub fn parse(src: &str) -> Result<Vec<Spanned<Statement>>, Vec<Rich<char>>> {
    let (statements, errs) = parser().parse(src).into_output_errors();
    if !errs.is_empty() {
        debug!(errors = errs.len(), "track source failed to parse");
        return Err(errs);
    }
    debug!(statements = statements.as_ref().map_or(0, Vec::len), "parsed track source");
    statements.ok_or(errs)
}

/// Render `(message, label, span)` triples against the source they came from.
pub fn report(src: &str, errors: impl IntoIterator<Item = (String, String, SimpleSpan)>) -> String {
    let mut out = Vec::new();
    for (message, label, span) in errors {
        let _ = Report::build(ReportKind::Error, span.into_range())
            .with_config(Config::default().with_color(false))
            .with_message(message)
            .with_label(
                Label::new(span.into_range())
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write(Source::from(src), &mut out);
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Render chumsky errors with ariadne
pub fn report_syntax(src: &str, errs: &[Rich<char>]) -> String {
    report(
        src,
        errs.iter()
            .map(|e| (e.to_string(), e.reason().to_string(), *e.span())),
    )
}
