use crate::plate::Plate;
use crate::types::{VehicleInfo, VehicleStatus};

// There is no real registry behind this service; records are synthesized
// from fixed tables, keyed off a hash of the plate so repeat scans agree.
const MODELS: [&str; 7] = [
    "Fiat Argo",
    "Hyundai HB20",
    "Chevrolet Onix",
    "Jeep Renegade",
    "VW T-Cross",
    "Toyota Corolla",
    "Honda Civic",
];

const COLORS: [&str; 6] = ["Branco", "Preto", "Prata", "Cinza", "Vermelho", "Azul"];

const CITIES: [&str; 5] = [
    "São Paulo - SP",
    "Rio de Janeiro - RJ",
    "Belo Horizonte - MG",
    "Curitiba - PR",
    "Porto Alegre - RS",
];

const MSG_REGULAR: &str = "Veículo em situação regular. Nenhuma restrição encontrada.";
const MSG_DEBTS: &str =
    "Constam débitos de IPVA e multas para este veículo. Recomenda-se a quitação.";
const MSG_THEFT: &str = "ALERTA: Consta registro de roubo ou furto para este veículo. \
Contate as autoridades imediatamente.";

/// 31-based fold over the plate characters, wrapped to 32 bits.
fn fold_hash(text: &str) -> u32 {
    let mut hash: i32 = 0;
    for byte in text.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    hash.unsigned_abs()
}

/// Derives the mocked registry record for a plate. Pure: no I/O, no
/// randomness, the same plate always yields an identical record.
pub fn lookup(plate: &Plate) -> VehicleInfo {
    let hash = fold_hash(plate.as_str());

    // 70% regular, 20% with debts, 10% theft record.
    let (status, message) = match hash % 10 {
        0..=6 => (VehicleStatus::Regular, MSG_REGULAR),
        7 | 8 => (VehicleStatus::Debts, MSG_DEBTS),
        _ => (VehicleStatus::Theft, MSG_THEFT),
    };

    VehicleInfo {
        plate: plate.clone(),
        model: MODELS[hash as usize % MODELS.len()].to_string(),
        year: 2018 + (hash % 6) as u16,
        color: COLORS[hash as usize % COLORS.len()].to_string(),
        city: CITIES[hash as usize % CITIES.len()].to_string(),
        status,
        message: message.to_string(),
    }
}
