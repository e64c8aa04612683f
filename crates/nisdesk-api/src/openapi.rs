//! OpenAPI document assembly.
//!
//! Every handler annotated with `#[utoipa::path]` is listed here; the
//! generated document is served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::{ErrorBody, ErrorDetail};
use crate::routes;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::orgs::create_org,
        routes::orgs::get_org,
        routes::members::list_members,
        routes::members::change_role,
        routes::members::set_active,
        routes::invites::create_invite,
        routes::invites::list_invites,
        routes::invites::accept_invite,
        routes::invites::cancel_invite,
        routes::sites::create_site,
        routes::sites::list_sites,
        routes::incidents::create_incident,
        routes::incidents::list_incidents,
        routes::incidents::get_incident,
        routes::incidents::incident_timer,
        routes::incidents::report_incident,
        routes::obligations::list_obligations,
        routes::obligations::seed_obligations,
        routes::obligations::file_obligation,
        routes::notes::list_notes,
        routes::notes::create_note,
        routes::records::create_record,
        routes::records::list_records,
        routes::records::update_status,
        routes::records::delete_record,
        routes::exports::export_annex_e,
        routes::exports::annex_e_schema,
    ),
    components(schemas(
        ErrorBody,
        ErrorDetail,
        routes::orgs::CreateOrgRequest,
        routes::orgs::OrgResponse,
        routes::members::MemberResponse,
        routes::members::MemberListResponse,
        routes::members::ChangeRoleRequest,
        routes::members::SetActiveRequest,
        routes::invites::CreateInviteRequest,
        routes::invites::InviteResponse,
        routes::invites::AcceptInviteResponse,
        routes::invites::InviteListResponse,
        routes::sites::CreateSiteRequest,
        routes::sites::SiteResponse,
        routes::sites::SiteListResponse,
        routes::incidents::CreateIncidentRequest,
        routes::incidents::TimerBadge,
        routes::incidents::IncidentResponse,
        routes::incidents::IncidentListResponse,
        routes::incidents::ReportRequest,
        routes::obligations::ObligationResponse,
        routes::obligations::ObligationListResponse,
        routes::obligations::FileObligationRequest,
        routes::notes::CreateNoteRequest,
        routes::notes::NoteResponse,
        routes::notes::NoteListResponse,
        routes::records::CreateRecordRequest,
        routes::records::UpdateStatusRequest,
        routes::records::RecordResponse,
        routes::records::RecordListResponse,
    )),
    tags(
        (name = "orgs", description = "Organisations"),
        (name = "members", description = "Guarded membership management"),
        (name = "invites", description = "Invitation lifecycle"),
        (name = "sites", description = "Operational sites"),
        (name = "incidents", description = "Incident intake and clocks"),
        (name = "obligations", description = "Per-authority notification obligations"),
        (name = "notes", description = "Incident log"),
        (name = "records", description = "Compliance requirement tracking"),
        (name = "exports", description = "Annex E artifacts"),
    ),
    info(
        title = "nisdesk API",
        description = "Regulatory incident tracking and notification clocks for essential-service operators."
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_generates() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/v1/orgs"));
        assert!(json.contains("TimerBadge"));
    }

    #[test]
    fn every_tag_is_used() {
        let doc = ApiDoc::openapi();
        let declared: Vec<String> = doc
            .tags
            .iter()
            .flatten()
            .map(|t| t.name.clone())
            .collect();
        let used: Vec<String> = doc
            .paths
            .paths
            .values()
            .flat_map(|item| item.operations.values())
            .flat_map(|op| op.tags.iter().flatten().cloned())
            .collect();
        for tag in &declared {
            assert!(used.contains(tag), "unused tag {tag}");
        }
    }
}
