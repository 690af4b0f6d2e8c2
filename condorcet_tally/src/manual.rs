/*!

This is the long-form manual for `condorcet_tally` and the `condorcet` command line tool.

## How a poll is counted

Every ballot is a full ranking of the candidates. For each pair of candidates, the
poll counts how many ballots rank one above the other. These counts form the
pairwise matrix: `cell[i][j]` is the number of ballots ranking `i` above `j`.

A candidate is the Condorcet winner if it beats every other candidate head-to-head,
that is `cell[i][j] > cell[j][i]` for every other candidate `j`. A tie counts as a
loss. When the ballots form a cycle (A beats B, B beats C, C beats A), or when some
pairs are tied, there is no winner. The tool reports it as such and does not try to
break the cycle.

Each accepted ballot publishes a snapshot:

```text
{"sequence": 3, "numCandidates": 3, "stateMatrix": [0, 2, 1, 1, 0, 2, 2, 1, 0], "digest": "..."}
```

The matrix is flattened row by row: `cell[i][j]` is at `stateMatrix[i * numCandidates + j]`.
The digest chains every accepted ballot (voter and ranking) with SHA-256, starting
from a digest of the candidate list. Recounting the same ballots in the same order
gives the same digests.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values
* `json` a list of ballots
* `xlsx` an Excel spreadsheet, for example an export of Microsoft Forms or Google Forms

Two ballot encodings are accepted, controlled by `rankingFormat`:
* `order` (default): the choices are listed from the most preferred to the least preferred.
* `positions`: one column per candidate, in the order of the candidates in the
  configuration, with the rank given to this candidate (starting at 1 in files).

Every ballot must rank every candidate exactly once. Ballots that do not, and
second ballots from the same voter, are rejected and listed in the summary.

### csv

```text
voter,choice 1,choice 2,choice 3
alice,A,B,C
bob,B,C,A
```

The voter column is optional. If it is missing, every ballot gets an identifier
made of the file name and the line number. The header row is optional.

With the `positions` encoding:

```text
voter,A,B,C
alice,1,2,3
bob,3,1,2
```

### json

```text
[
  {"voter": "alice", "ranking": ["A", "B", "C"]},
  {"voter": "bob", "ranking": ["B", "C", "A"]}
]
```

With the `positions` encoding, `ranking` is a list of numbers (starting at 1).

### xlsx

The same layout as `csv`, in the first worksheet (or the one named with
`excelWorksheetName`).

## Configuration

The configuration is a JSON file:

```text
{
  "outputSettings": {"contestName": "Lunch"},
  "candidates": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
  "rules": {"maxIdentifierLength": "32", "ballotCapacity": "1000"},
  "ballotSources": [
    {"provider": "csv", "filePath": "ballots.csv", "idColumnIndex": 1,
     "firstVoteColumnIndex": 2, "firstVoteRowIndex": 2}
  ]
}
```

- `maxIdentifierLength` (string, `max` or a number): the maximum length of a candidate
  name, in bytes.
- `ballotCapacity` (string, optional): the maximum number of ballots.
- `idColumnIndex` (number, optional): the column of the voter identifiers (starting at 1).
- `firstVoteColumnIndex` (number, default 1): the first column with a choice.
- `firstVoteRowIndex` (number, default 1): the first row with a ballot. Use 2 to skip a header.
- `rankingFormat` (string, optional): `order` or `positions`.
- `excelWorksheetName` (string, optional): for Excel inputs, the worksheet to use.

File paths are relative to the directory of the configuration file.

 */
