//! Token-level nesting estimate, run before the recursive parser.

use std::mem;

use swc_core::ecma::ast::EsVersion;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::token::{Keyword, Token, Word};
use swc_core::ecma::parser::Syntax;

use super::{input, offset, ParseError};

/// An open bracket and the right-recursive chains (`else`, `?`, `=>`) seen
/// directly inside it since its last statement or list boundary.
#[derive(Debug, Default)]
struct Frame {
    chain: usize,
}

/// Fails with "nesting too deep" once the estimate passes `limit`.
///
/// The estimate counts open brackets plus chained `else`, `?` and `=>`
/// tokens, which is what drives recursion in the parser and in every later
/// walk over the tree. Lexical errors end the scan; the parser reports them.
pub fn check(source: &str, limit: usize) -> Result<(), ParseError> {
    let lexer = Lexer::new(Syntax::Es(Default::default()), EsVersion::latest(), input(source)?, None);
    let mut frames = vec![Frame::default()];
    let mut depth = 0;
    // Set after `;` or a closing brace: a chain only continues through `else`.
    let mut boundary = false;

    for item in lexer {
        if boundary {
            boundary = false;
            if !matches!(item.token, Token::Word(Word::Keyword(Keyword::Else))) {
                depth -= reset(&mut frames);
            }
        }

        match &item.token {
            Token::LParen | Token::LBracket | Token::LBrace | Token::DollarLBrace => {
                frames.push(Frame::default());
                depth += 1;
            }
            Token::RParen | Token::RBracket | Token::RBrace => {
                if frames.len() > 1 {
                    if let Some(frame) = frames.pop() {
                        depth -= 1 + frame.chain;
                    }
                }
                boundary = matches!(item.token, Token::RBrace);
            }
            Token::Semi => boundary = true,
            Token::Comma => depth -= reset(&mut frames),
            Token::Word(Word::Keyword(Keyword::Else)) | Token::QuestionMark | Token::Arrow => {
                if let Some(frame) = frames.last_mut() {
                    frame.chain += 1;
                    depth += 1;
                }
            }
            Token::Error(_) => return Ok(()),
            _ => {}
        }

        if depth > limit {
            return Err(ParseError::at(
                source,
                offset(item.span.lo),
                format!("nesting too deep (more than {limit} levels)"),
            ));
        }
    }
    Ok(())
}

fn reset(frames: &mut [Frame]) -> usize {
    frames.last_mut().map_or(0, |frame| mem::take(&mut frame.chain))
}
