/*!

This is the long-form manual for `irv_audit` and `irvrla`.

## Ballot interpretation

Ranked ballots are written as a list of marks `name(rank)`, for example
`Alice(1),Bob(2),Chuan(3)`. Spaces around the name and inside the parentheses
are ignored, and a name may itself contain parentheses: only the last group
is read as the rank.

A ballot is valid when its ranks are exactly 1, 2, 3, ... and no candidate is
ranked twice. Other ballots are interpreted as follows, in this order:

1. duplicates: a candidate keeps only its most preferred rank
2. overvotes: the ballot ends before the first rank given to several candidates
3. skipped ranks: the ballot ends at the last rank before a gap. A ballot
   without a first choice is empty.

| raw ballot                               | interpretation          |
|------------------------------------------|-------------------------|
| `Alice(1),Bob(1),Chuan(1),Chuan(2),Bob(3)` | (empty)               |
| `Bob(1),Alice(2),Chuan(2),Chuan(3)`      | `Bob`                   |
| `Alice(1),Bob(3)`                        | `Alice`                 |
| `Alice(1),Alice(2),Bob(3)`               | `Alice`                 |
| `Bob(1),Alice(2),Bob(2),Chuan(3)`        | `Bob`, `Alice`, `Chuan` |

`irvrla --input-type ballots --input ballots.txt` prints the interpretation of a
text file with one ballot per line. A line may start with an identifier and a
colon (`b-17: Alice(1),Bob(2)`). Lines starting with `#` are ignored.

## Audit description

`irvrla --config audit.json` runs the audit described in a JSON file:

```json
{
  "contest": {
    "name": "Byron Mayoral",
    "universeSize": 200,
    "candidates": ["Alice", "Bob", "Chuan"]
  },
  "riskLimit": 0.05,
  "assertions": [
    {
      "margin": 20,
      "difficulty": 10.0,
      "assertion": { "type": "NEB", "winner": 0, "loser": 1 }
    },
    {
      "margin": 40,
      "difficulty": 5.0,
      "assertion": { "type": "NEN", "winner": 0, "loser": 2, "continuing": [0, 2] }
    }
  ],
  "auditedBallots": [
    {
      "cvrId": 1,
      "cvr": { "recordType": "UPLOADED", "choices": ["Alice(1)", "Bob(2)"] },
      "acvr": { "recordType": "AUDITOR_ENTERED", "choices": ["Alice(1)"], "consensus": "YES" },
      "multiplicity": 2
    }
  ]
}
```

- `contest.universeSize`: the number of ballots that may contain the contest. It must not be 0.
- `riskLimit` (optional): defaults to 0.03. The `--risk-limit` flag overrides it.
- `gamma` (optional): the error inflation factor, defaults to 1.03905.
- `assertions`: the output of the assertion generator. Candidates are given by their
  index in `contest.candidates`. `continuing` is only used by `NEN` assertions.
- `auditedBallots`: each machine record (`cvr`) with the ballot seen by the audit board
  (`acvr`). `choices` holds the raw marks and is left out when the contest is not on the
  ballot. `recordType` is one of `UPLOADED`, `AUDITOR_ENTERED`, `REAUDITED`,
  `PHANTOM_RECORD` (no machine record for this ballot) and `PHANTOM_BALLOT` (the paper
  ballot was not found). `consensus` is `YES` or `NO` for the audit board.
  `multiplicity` is the number of times the ballot was drawn (default 1).

## Summary

The summary contains, for each assertion, the counts of discrepancies of each type
(`twoUnder`, `oneUnder`, `other`, `oneOver`, `twoOver`), the number of ballots to audit
(`optimisticSamplesToAudit` if no more overstatements are found, `estimatedSamplesToAudit`
given the overstatements seen so far) and the current risk. The contest results are the
largest of these values. The largest discrepancy of each audited ballot is also reported.

With `--reference expected.json`, the summary is compared with the expected one and the
differences are printed.

 */
