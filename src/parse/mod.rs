mod error;
mod lexer;
mod parser;
mod token;

pub use error::{ParseError, SourcePosition};
pub use lexer::Lexeme;
pub use parser::NotationTokenizer;
pub use token::{ModifierOp, PostfixToken, Repeat, Span, TokenStream, Tokenizer};

pub fn tokenize(text: &str) -> Result<TokenStream, ParseError> {
    NotationTokenizer.tokenize(text)
}
