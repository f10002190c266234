//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 document for the Vigil screening API.

use utoipa::OpenApi;

use crate::handlers::{HealthResponse, PredictResponse, ReadyResponse, TrainResponse};

/// Vigil API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vigil - Video Impairment Screening API",
        version = "0.1.0",
        description = r#"
## Video Impairment Screening API

Vigil labels short video clips as `drunk` or `sober` from a simple visual
signature: about fifty evenly spaced frames, reduced to 32x32 grayscale and
averaged.

### How It Works

1. Place training clips under `drunk/` and `sober/` in the dataset root
2. **Train** via `POST /train`; features are cached between runs
3. **Predict** via `POST /predict` with the clip in the `video` field
"#,
        license(
            name = "MIT OR Apache-2.0",
            url = "https://github.com/vigil-ml/vigil/blob/main/LICENSE"
        ),
        contact(
            name = "Vigil Team",
            url = "https://github.com/vigil-ml/vigil"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    tags(
        (name = "Model", description = "Train the classifier and classify videos"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::train::train_handler,
        crate::handlers::predict::predict_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            TrainResponse,
            PredictResponse,
        )
    )
)]
pub struct ApiDoc;
