// Reader for plain text files of raw ballots.
//
// One ballot per line, e.g. `Alice(1),Bob(2),Chuan(2)`. A line may start
// with an explicit identifier followed by a colon: `b-17: Alice(1)`. The
// identifier may not contain parentheses.
// Empty lines and lines starting with '#' are skipped.

use crate::rla::io_common::make_default_id;
use crate::rla::*;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawBallot {
    pub id: String,
    pub raw: String,
}

pub fn read_ballots(path: &str) -> RlaResult<Vec<RawBallot>> {
    let contents = fs::read_to_string(path).context(OpeningBallotsSnafu {
        path: path.to_string(),
    })?;
    Ok(parse_ballot_lines(path, &contents))
}

pub fn parse_ballot_lines(path: &str, contents: &str) -> Vec<RawBallot> {
    let default_id = make_default_id(path);
    let mut res: Vec<RawBallot> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (id, raw) = match line.split_once(':') {
            Some((id, raw)) if !id.contains('(') => (id.trim().to_string(), raw.trim()),
            _ => (default_id(lineno), line),
        };
        debug!("parse_ballot_lines: {}: {:?}", id, raw);
        res.push(RawBallot {
            id,
            raw: raw.to_string(),
        });
    }
    res
}
