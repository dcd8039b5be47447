use crate::capture::CapturedImage;
use crate::recognizer::PlateReader;
use crate::types::VehicleInfo;
use crate::vehicle;
use log::{error, info};
use std::sync::Arc;
use uuid::Uuid;

pub const MSG_NO_PLATE: &str =
    "Nenhuma placa detectada. Tente novamente com uma imagem mais nítida.";
pub const MSG_SCAN_FAILED: &str =
    "Ocorreu um erro ao processar a imagem. Verifique sua conexão e tente novamente.";

/// What a finished scan produced. A results screen shows a vehicle record or
/// an error message, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Vehicle(VehicleInfo),
    NoPlate,
    Failed,
}

impl ScanOutcome {
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            ScanOutcome::Vehicle(_) => None,
            ScanOutcome::NoPlate => Some(MSG_NO_PLATE),
            ScanOutcome::Failed => Some(MSG_SCAN_FAILED),
        }
    }
}

/// Screen-by-screen state of one scanning session. Payloads only exist in
/// the states where they mean something.
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Welcome,
    Scanning,
    Loading { image: CapturedImage },
    Results {
        image: Option<CapturedImage>,
        outcome: ScanOutcome,
    },
}

pub struct Session {
    reader: Arc<dyn PlateReader>,
    state: AppState,
}

impl Session {
    pub fn new(reader: Arc<dyn PlateReader>) -> Session {
        Session {
            reader,
            state: AppState::Welcome,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn start_scan(&mut self) {
        self.reset();
    }

    /// Drops any previous result and goes back to the camera.
    pub fn reset(&mut self) {
        self.state = AppState::Scanning;
    }

    /// Runs the one async operation of the whole flow: enters Loading with
    /// the captured frame, asks the reader for a plate, and lands in Results
    /// whatever happens.
    pub async fn capture(&mut self, image: CapturedImage) -> &AppState {
        let scan_id = Uuid::new_v4();
        self.state = AppState::Loading {
            image: image.clone(),
        };
        info!("[{}] Frame captured, querying the vision model", scan_id);

        let outcome = match self.reader.read_plate(&image).await {
            Ok(Some(plate)) => {
                info!("[{}] Recognized plate {}", scan_id, plate);
                ScanOutcome::Vehicle(vehicle::lookup(&plate))
            }
            Ok(None) => {
                info!("[{}] No readable plate in frame", scan_id);
                ScanOutcome::NoPlate
            }
            Err(e) => {
                error!("[{}] Recognition failed: {}", scan_id, e);
                ScanOutcome::Failed
            }
        };

        self.state = AppState::Results {
            image: Some(image),
            outcome,
        };
        &self.state
    }
}
