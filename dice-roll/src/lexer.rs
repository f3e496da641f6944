/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use crate::dice_types::{Operator, Token};

#[cfg(feature = "logging")]
use log::debug;

pub const TAG_MARKER: char = '#';

/// Input accepted by the lexer: one string, or words already split by the caller.
pub trait RequestWords {
    fn pieces(&self) -> Vec<&str>;
}

impl RequestWords for str {
    fn pieces(&self) -> Vec<&str> {
        split_tokens(self)
    }
}

impl RequestWords for String {
    fn pieces(&self) -> Vec<&str> {
        split_tokens(self)
    }
}

impl<S: AsRef<str>> RequestWords for [S] {
    fn pieces(&self) -> Vec<&str> {
        self.iter().flat_map(|w| split_tokens(w.as_ref())).collect()
    }
}

impl<S: AsRef<str>> RequestWords for Vec<S> {
    fn pieces(&self) -> Vec<&str> {
        self.as_slice().pieces()
    }
}

fn delimiter_len(rest: &str) -> Option<usize> {
    Operator::prefix_of(rest)
        .map(|op| op.symbol().len())
        .or_else(|| {
            rest.chars()
                .next()
                .filter(|c| *c == TAG_MARKER || c.is_whitespace())
                .map(char::len_utf8)
        })
}

/// Splits `word` around operators, the tag marker and single whitespace characters.
///
/// Delimiters are kept as pieces of their own. Adjacent delimiters leave an empty piece
/// between them, so `"A + B"` yields seven pieces.
pub fn split_tokens(word: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut position = 0;
    while let Some(rest) = word.get(position..).filter(|r| !r.is_empty()) {
        match delimiter_len(rest) {
            Some(len) => {
                pieces.push(&word[start..position]);
                pieces.push(&word[position..position + len]);
                position += len;
                start = position;
            }
            None => position += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    pieces.push(&word[start..]);
    pieces
}

/// Drops empty pieces and whitespace.
pub fn filter_tokens<'a, I: IntoIterator<Item = &'a str>>(pieces: I) -> Vec<&'a str> {
    pieces
        .into_iter()
        .filter(|p| !p.is_empty() && !p.starts_with(char::is_whitespace))
        .collect()
}

pub fn split_filter<W: RequestWords + ?Sized>(words: &W) -> Vec<&str> {
    filter_tokens(words.pieces())
}

fn classify(piece: &str) -> Token {
    if piece.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = piece.parse() {
            return Token::Number(n);
        }
    }
    match Operator::from_symbol(piece) {
        Some(op) => Token::Operator(op),
        None => Token::Raw(piece.to_owned()),
    }
}

/// Classifies filtered pieces. Everything from the first piece starting with `#` on
/// collapses into one trailing [`Token::Tag`].
pub fn lex(pieces: &[&str]) -> Vec<Token> {
    match pieces.iter().position(|p| p.starts_with(TAG_MARKER)) {
        Some(index) => {
            let mut tokens: Vec<Token> = pieces[..index].iter().map(|p| classify(p)).collect();
            let tag = pieces[index..].join(" ");
            tokens.push(Token::Tag(
                tag.trim_matches(|c: char| c == TAG_MARKER || c == ' ')
                    .to_owned(),
            ));
            tokens
        }
        None => pieces.iter().map(|p| classify(p)).collect(),
    }
}

/// Lexes a roll request into its working tokens and its tag (empty if there is none).
pub fn tokenize<W: RequestWords + ?Sized>(words: &W) -> (Vec<Token>, String) {
    let mut tokens = lex(&split_filter(words));
    let tag = match tokens.last() {
        Some(Token::Tag(_)) => match tokens.pop() {
            Some(Token::Tag(tag)) => tag,
            _ => String::new(),
        },
        _ => String::new(),
    };
    #[cfg(feature = "logging")]
    {
        debug!("tokenized {:?} with tag {:?}", &tokens, &tag);
    }
    (tokens, tag)
}
