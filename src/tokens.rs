use std::io::{self, BufRead};

/// Longest token kept, in bytes. Longer runs are truncated at this
/// boundary and the remainder of the run is consumed and dropped.
pub const MAX_TOKEN_LENGTH: usize = 1000;

/// Separator joining the components of a multi-word token.
pub const SEP_CHAR: u8 = b'_';

/// Event produced by the token source. Newlines matter downstream (they
/// bound context windows), so they get their own event.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenEvent {
    Token(Vec<u8>),
    LineBreak,
}

enum Scan {
    Eof,
    Continue(usize),
    Token(usize),
    LineBreak(usize),
}

/// Lazy token stream over raw bytes. Tokens are maximal runs of
/// non-whitespace; any ASCII whitespace ends a token and a newline
/// additionally yields its own event.
pub struct Tokens<R> {
    reader: R,
}

impl<R: BufRead> Tokens<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for Tokens<R> {
    type Item = io::Result<TokenEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut token: Vec<u8> = Vec::new();
        let mut in_token = false;

        loop {
            let scan = {
                let buf = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) => return Some(Err(e)),
                };

                if buf.is_empty() {
                    Scan::Eof
                } else {
                    let mut consumed = 0;
                    let mut boundary = None;

                    for &byte in buf {
                        if byte.is_ascii_whitespace() {
                            if in_token {
                                // The whitespace byte stays unconsumed: a
                                // newline must still produce its own event.
                                boundary = Some(Scan::Token(consumed));
                                break;
                            }

                            consumed += 1;

                            if byte == b'\n' {
                                boundary = Some(Scan::LineBreak(consumed));
                                break;
                            }
                        } else {
                            in_token = true;
                            consumed += 1;

                            if token.len() < MAX_TOKEN_LENGTH {
                                token.push(byte);
                            }
                        }
                    }

                    boundary.unwrap_or(Scan::Continue(consumed))
                }
            };

            match scan {
                Scan::Eof => {
                    return if in_token {
                        Some(Ok(TokenEvent::Token(token)))
                    } else {
                        None
                    };
                }
                Scan::Continue(amount) => self.reader.consume(amount),
                Scan::Token(amount) => {
                    self.reader.consume(amount);
                    return Some(Ok(TokenEvent::Token(token)));
                }
                Scan::LineBreak(amount) => {
                    self.reader.consume(amount);
                    return Some(Ok(TokenEvent::LineBreak));
                }
            }
        }
    }
}

/// Components of a multi-word token. Only components terminated by the
/// separator are yielded: "new_york" contributes "new" alone, while
/// "new_york_" contributes both "new" and "york". A token without any
/// separator yields nothing.
pub fn sub_tokens(token: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    let mut components = token.split(|byte| *byte == SEP_CHAR);
    components.next_back();
    components
}
