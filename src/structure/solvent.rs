/// Residue names treated as solvent: crystallographic waters and the water
/// models of common MD force fields.
const SOLVENT_RESIDUES: &[&str] = &[
    "HOH", "WAT", "H2O", "DOD", "D2O", "SOL", "TIP", "TP3", "TIP3", "T3P",
    "SPC", "TP4", "TIP4", "T4P", "TP5", "TIP5",
];

/// Whether `res_name` names a solvent residue. Surrounding whitespace and
/// case are ignored.
#[must_use]
pub fn is_solvent_residue(res_name: &str) -> bool {
    let name = res_name.trim();
    SOLVENT_RESIDUES
        .iter()
        .any(|solvent| solvent.eq_ignore_ascii_case(name))
}
