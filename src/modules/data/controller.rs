use crate::prelude::*;

pub const DATA_RETRIEVED: &str = "Data retrieved successfully";
pub const DATA_SAVED: &str = "Data saved successfully";
const RETRIEVE_FAILED: &str = "Error retrieving data";
const SAVE_FAILED: &str = "Error saving data";

type DataResponse = std::result::Result<(StatusCode, Json<Message>), ApiError>;

/// Fixed-response data endpoints. Neither operation touches storage.
#[derive(Default)]
pub struct DataController;

impl Injectable for DataController {
    fn inject(_container: &Container) -> Result<Self> {
        Ok(Self)
    }
}

impl DataController {
    pub async fn get_data(&self) -> DataResponse {
        respond(Ok(()), StatusCode::OK, DATA_RETRIEVED, RETRIEVE_FAILED)
    }

    pub async fn post_data(&self) -> DataResponse {
        respond(Ok(()), StatusCode::CREATED, DATA_SAVED, SAVE_FAILED)
    }
}

fn respond(
    outcome: std::result::Result<(), ApiError>,
    status: StatusCode,
    success: &'static str,
    failure: &'static str,
) -> DataResponse {
    outcome
        .map(|()| (status, Json(Message::new(success))))
        .map_err(|e| e.into_operation_failure(failure))
}

pub async fn get_data(Inject(controller): Inject<DataController>) -> DataResponse {
    controller.get_data().await
}

pub async fn post_data(Inject(controller): Inject<DataController>) -> DataResponse {
    controller.post_data().await
}
