/// Capability flags of a fluviometric station, as recorded in
/// `tipo_estacao_flu` or answered `Sim`/`Não` in survey spreadsheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub stage: bool,
    pub discharge: bool,
    pub water_quality: bool,
    pub sediment: bool,
    pub telemetry: bool,
}

impl Capabilities {
    /// Typology code with letters in fixed order `F D Q S T`, or `None`
    /// when no capability is set.
    pub fn typology(&self) -> Option<String> {
        let letters: String = [
            (self.stage, 'F'),
            (self.discharge, 'D'),
            (self.water_quality, 'Q'),
            (self.sediment, 'S'),
            (self.telemetry, 'T'),
        ]
        .into_iter()
        .filter_map(|(set, letter)| set.then_some(letter))
        .collect();

        (!letters.is_empty()).then_some(letters)
    }
}
