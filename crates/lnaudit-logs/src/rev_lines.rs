//! Backward line iteration over seekable byte sources.

use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};

const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Yields the lines of a seekable source from last to first.
///
/// The source is read in fixed-size blocks starting at the end, so a consumer
/// that stops early never touches the head of the file. Line terminators
/// (`\n` or `\r\n`) are stripped and bytes are decoded as lossy UTF-8. A final
/// terminator does not produce an empty trailing line.
#[derive(Debug)]
pub struct ReverseLines<R> {
    reader: R,
    /// Bytes in `[0, unread)` have not been loaded yet.
    unread: u64,
    /// Loaded bytes not yet returned; always starts at offset `unread`.
    head: Vec<u8>,
    /// Newline-free fragments that follow `head`, in file order. Joined once
    /// when the line they belong to is complete.
    partial: VecDeque<Vec<u8>>,
    block_size: usize,
    emitted_any: bool,
    finished: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_block_size(reader, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(mut reader: R, block_size: usize) -> io::Result<Self> {
        let length = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            unread: length,
            head: Vec::new(),
            partial: VecDeque::new(),
            block_size: block_size.max(1),
            emitted_any: false,
            finished: length == 0,
        })
    }

    fn load_previous_block(&mut self) -> io::Result<()> {
        let block = u64::try_from(self.block_size).unwrap_or(u64::MAX);
        let read_len = block.min(self.unread);
        let start = self.unread - read_len;
        self.reader.seek(SeekFrom::Start(start))?;
        let mut chunk = vec![0_u8; usize::try_from(read_len).unwrap_or(self.block_size)];
        self.reader.read_exact(&mut chunk)?;
        let scanned = std::mem::replace(&mut self.head, chunk);
        if !scanned.is_empty() {
            self.partial.push_front(scanned);
        }
        self.unread = start;
        Ok(())
    }

    fn take_line(&mut self, from: usize) -> String {
        let mut bytes = self.head.split_off(from);
        for fragment in self.partial.drain(..) {
            bytes.extend_from_slice(&fragment);
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if let Some(newline) = self.head.iter().rposition(|byte| *byte == b'\n') {
                let at_source_end = !self.emitted_any
                    && self.partial.is_empty()
                    && newline + 1 == self.head.len();
                let line = self.take_line(newline + 1);
                self.head.truncate(newline);
                self.emitted_any = true;
                if at_source_end {
                    // Terminator at end of source.
                    continue;
                }
                return Ok(Some(line));
            }
            if self.unread == 0 {
                self.finished = true;
                self.emitted_any = true;
                return Ok(Some(self.take_line(0)));
            }
            self.load_previous_block()?;
        }
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}
