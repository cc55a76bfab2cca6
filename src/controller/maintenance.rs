use axum::{
    extract::{
        multipart::MultipartError, rejection::QueryRejection, FromRequest, Multipart, Query,
        Request, State,
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form,
};
use cyder_tools::log::{debug, info};

use crate::{
    database::maintenance::{MaintenanceQueryPayload, MaintenanceSummary, NewMaintenanceRecord},
    utils::{trimmed, HttpListResult, HttpResult},
};

use super::{create_state_router, error::BaseError, AppState, StateRouter};

const REGISTERED: &str = "Manutenção registrada com sucesso!";
const FOUND: &str = "Dados encontrados.";
const NOTHING_FOUND: &str = "Nenhum registro encontrado.";
const INVALID_ACCESS: &str = "Acesso inválido.";

/// Form fields posted by the maintenance page.
#[derive(Debug, Default)]
struct InsertMaintenance {
    coxo_id: Option<String>,
    data_manut: Option<String>,
    usuario: Option<String>,
}

impl FromIterator<(String, String)> for InsertMaintenance {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(fields: I) -> Self {
        let mut payload = InsertMaintenance::default();
        // a repeated field keeps its last value
        for (name, value) in fields {
            match name.as_str() {
                "coxo_idPost" => payload.coxo_id = Some(value),
                "data_manutPost" => payload.data_manut = Some(value),
                "usuarioPost" => payload.usuario = Some(value),
                _ => {}
            }
        }
        payload
    }
}

impl InsertMaintenance {
    fn validate(self) -> Result<NewMaintenanceRecord, BaseError> {
        match (
            trimmed(self.coxo_id.as_deref()),
            trimmed(self.data_manut.as_deref()),
            trimmed(self.usuario.as_deref()),
        ) {
            (Some(coxo_id), Some(data_manut), Some(usuario)) => Ok(NewMaintenanceRecord {
                coxo_id,
                data_manut,
                usuario,
            }),
            _ => Err(BaseError::MissingFields),
        }
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

/// Collects the text parts of a multipart body. File uploads are not form fields.
async fn multipart_fields(
    mut multipart: Multipart,
) -> Result<Vec<(String, String)>, MultipartError> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        fields.push((name, field.text().await?));
    }
    Ok(fields)
}

/// Decodes an urlencoded or multipart body into its fields in body order.
/// An unreadable body carries no fields, so it fails validation later.
async fn form_fields(request: Request, state: &AppState) -> Vec<(String, String)> {
    if is_multipart(&request) {
        let fields = match Multipart::from_request(request, state).await {
            Ok(multipart) => multipart_fields(multipart).await.map_err(|e| e.to_string()),
            Err(rejection) => Err(rejection.to_string()),
        };
        fields.unwrap_or_else(|err| {
            debug!("ignoring unreadable multipart maintenance form: {}", err);
            Vec::new()
        })
    } else {
        match Form::<Vec<(String, String)>>::from_request(request, state).await {
            Ok(Form(fields)) => fields,
            Err(rejection) => {
                debug!("ignoring unreadable maintenance form: {}", rejection);
                Vec::new()
            }
        }
    }
}

async fn insert_one(
    State(state): State<AppState>,
    request: Request,
) -> Result<HttpResult, BaseError> {
    let payload: InsertMaintenance = form_fields(request, &state).await.into_iter().collect();
    let record = payload.validate()?;
    let coxo_id = record.coxo_id.clone();

    state
        .db
        .run(move |conn| NewMaintenanceRecord::insert_one(conn, &record))
        .await?;

    info!("maintenance registered for coxo {}", coxo_id);
    Ok(HttpResult::success(REGISTERED))
}

async fn list(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let payload = match query {
        Ok(Query(pairs)) => pairs.into_iter().collect::<MaintenanceQueryPayload>().normalize(),
        Err(rejection) => {
            debug!("rejecting maintenance query: {}", rejection);
            let message = BaseError::ParamInvalid.to_string();
            return HttpListResult::<MaintenanceSummary>::failure(message).into_response();
        }
    };

    match state
        .db
        .run(move |conn| MaintenanceSummary::list(conn, &payload))
        .await
    {
        Ok(list) if list.is_empty() => {
            HttpListResult::<MaintenanceSummary>::failure(NOTHING_FOUND).into_response()
        }
        Ok(list) => {
            debug!("found {} maintenance records", list.len());
            HttpListResult::new(FOUND, list).into_response()
        }
        Err(err) if err.is_fatal() => err.into_response(),
        Err(err) => HttpListResult::<MaintenanceSummary>::failure(err.to_string()).into_response(),
    }
}

async fn invalid_write_access() -> HttpResult {
    HttpResult::failure(INVALID_ACCESS)
}

async fn invalid_read_access() -> HttpListResult<MaintenanceSummary> {
    HttpListResult::failure(INVALID_ACCESS)
}

pub fn create_maintenance_router() -> StateRouter {
    let insert = post(insert_one).fallback(invalid_write_access);
    let read = get(list).fallback(invalid_read_access);

    // the `.php` paths keep the existing form pages working unchanged
    create_state_router()
        .route("/insert_manutencao", insert.clone())
        .route("/insert_manutencao.php", insert)
        .route("/read_manutencao", read.clone())
        .route("/read_manutencao.php", read)
}
