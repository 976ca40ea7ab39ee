//! Reading and writing whitespace delimited SMILES files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::chem::{parse_smiles, Molecule};
use crate::error::{LigError, Result};

/// Header written at the top of every SMILES file.
pub const SMILES_HEADER: &str = "SMILES Name";

/// Parse the records of a SMILES file.
///
/// Each line holds a SMILES string in the first column and an optional name
/// in the second, separated by spaces or tabs. Records without a name are
/// named after their zero-based record index. Records that fail to parse are
/// skipped with a warning.
pub fn parse_smiles_records(content: &str, title_line: bool, source: &str) -> Vec<Molecule> {
    let mut molecules = Vec::new();
    let mut lines = content.lines().enumerate();
    if title_line {
        lines.next();
    }

    let mut index = 0;
    for (line_no, line) in lines {
        let mut fields = line.split([' ', '\t']).filter(|f| !f.is_empty());
        let Some(smiles) = fields.next() else {
            continue;
        };
        let name = fields
            .next()
            .map_or_else(|| index.to_string(), |n| n.to_string());
        index += 1;

        match parse_smiles(smiles) {
            Ok(mol) => molecules.push(mol.with_record(smiles, name)),
            Err(e) => warn!("{source}:{}: skipping {name}: {e}", line_no + 1),
        }
    }
    molecules
}

/// Read every parsable molecule from a SMILES file.
pub fn read_smiles_file(path: &Path, title_line: bool) -> Result<Vec<Molecule>> {
    if !path.is_file() {
        return Err(LigError::MissingInput(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| LigError::io(path, e))?;
    let molecules = parse_smiles_records(&content, title_line, &path.display().to_string());
    debug!("Read {} molecules from {}", molecules.len(), path.display());
    Ok(molecules)
}

/// Write molecules as `<smiles> <name>` lines below a `SMILES Name` header.
pub fn write_smiles_file<'a, I>(path: &Path, molecules: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Molecule>,
{
    let file = File::create(path).map_err(|e| LigError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let io_err = |e| LigError::io(path, e);

    writeln!(writer, "{SMILES_HEADER}").map_err(io_err)?;
    for mol in molecules {
        writeln!(writer, "{} {}", mol.smiles, mol.name).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_path() -> String {
        let root = env!("CARGO_MANIFEST_DIR");
        format!("{}/{}", root, "test-data/sample.smi")
    }

    #[test]
    fn test_read_with_title_line() {
        let mols = read_smiles_file(Path::new(&sample_path()), true).unwrap();
        // one of the records is not valid SMILES
        assert_eq!(mols.len(), 4);
        assert_eq!(mols[0].name, "ethanol");
        assert_eq!(mols[0].smiles, "CCO");
        assert_eq!(mols[3].name, "aspirin");
    }

    #[test]
    fn test_missing_names_use_record_index() {
        let mols = parse_smiles_records("CCO\nc1ccccc1\tbenzene\nCCN\n", false, "inline");
        let names: Vec<&str> = mols.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["0", "benzene", "2"]);
    }

    #[test]
    fn test_title_line_is_skipped() {
        let with_title = parse_smiles_records("SMILES Name\nCCO ethanol\n", true, "inline");
        assert_eq!(with_title.len(), 1);

        // without skipping, the header itself is an unparsable record
        let without = parse_smiles_records("SMILES Name\nCCO ethanol\n", false, "inline");
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].name, "ethanol");
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.smi");
        let mols = parse_smiles_records("C[C@H](N)C(=O)O alanine\nCCO ethanol\n", false, "inline");
        write_smiles_file(&path, &mols).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "SMILES Name\nC[C@H](N)C(=O)O alanine\nCCO ethanol\n");

        let reread = read_smiles_file(&path, true).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread[0].smiles, "C[C@H](N)C(=O)O");
    }

    #[test]
    fn test_empty_output_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.smi");
        write_smiles_file(&path, &Vec::new()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SMILES Name\n");
    }

    #[test]
    fn test_missing_input() {
        assert!(matches!(
            read_smiles_file(Path::new("no/such/file.smi"), true),
            Err(LigError::MissingInput(_))
        ));
    }
}
