// Ciclo de vida completo contra um Postgres real.
// Rodar com: DATABASE_URL=postgres://... cargo test -- --ignored

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration as ChronoDuration, Local, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use clinica_backend::{
    create_app,
    common::{error::AppError, pagination::Pagination},
    models::{
        appointment::{AppointmentFilters, AppointmentStatus},
        auth::{CreateUserPayload, Role, User},
        lead::{LeadFilters, LeadStatus, NewLead},
        metrics::{MetricEventType, TimeSeriesPoint},
        organization::{CreateOrganizationPayload, Organization},
        webhook::WebhookRequest,
    },
    services::authorization::TenantScope,
    AppState, Config,
};

const N8N_SECRET: &str = "segredo-do-n8n-123456";

fn config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "segredo-de-teste".to_string(),
        max_connections: 5,
        acquire_timeout: Duration::from_secs(3),
        bind_addr: "127.0.0.1:0".to_string(),
        token_ttl_days: 1,
        super_admin: None,
    }
}

struct Clinic {
    org: Organization,
    admin: User,
    operador: User,
}

async fn setup_clinic(state: &AppState, root: &User, slug: &str) -> Clinic {
    let org = state
        .organization_service
        .create_organization(
            root,
            &CreateOrganizationPayload {
                name: format!("Clínica {}", slug),
                slug: slug.to_string(),
                webhook_url: Some("https://n8n.exemplo.com/webhook/clinica".to_string()),
                whatsapp_link: None,
                webhook_secret: Some(N8N_SECRET.to_string()),
                metadata: None,
            },
        )
        .await
        .unwrap();

    let new_user = |email: &str, role: Role| CreateUserPayload {
        name: email.to_string(),
        email: email.to_string(),
        password: "senha-forte".to_string(),
        role: Some(role),
        organization_id: Some(org.id),
    };

    let admin = state
        .auth_service
        .create_user(root, &new_user(&format!("admin@{}.com", slug), Role::Admin))
        .await
        .unwrap();
    let operador = state
        .auth_service
        .create_user(&admin, &new_user(&format!("recepcao@{}.com", slug), Role::Operador))
        .await
        .unwrap();

    Clinic { org, admin, operador }
}

async fn setup(pool: PgPool) -> (AppState, User) {
    let state = AppState::from_pool(pool, &config());
    let root = state
        .auth_service
        .ensure_super_admin("root@plataforma.com", "senha-root")
        .await
        .unwrap();
    (state, root)
}

async fn count_events(pool: &PgPool, org: Uuid, event_type: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM metric_events WHERE organization_id = $1 AND type::text = $2")
        .bind(org)
        .bind(event_type)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn scope(user: &User) -> TenantScope {
    TenantScope::resolve(user, None).unwrap()
}

fn maria() -> NewLead {
    NewLead {
        name: "Maria Silva".to_string(),
        phone: "11999990001".to_string(),
        procedure: Some("Botox".to_string()),
        source: Some("Instagram".to_string()),
        notes: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn webhook_new_lead_then_qualify_then_schedule(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;

    let created = state
        .webhook_service
        .ingest(
            WebhookRequest {
                event_type: Some("new_lead".to_string()),
                organization_id: Some(clinic.org.id.to_string()),
                data: json!({ "name": "Maria Silva", "phone": "11999990001", "procedure": "Botox" }),
            },
            Some(N8N_SECRET),
        )
        .await
        .unwrap();
    let lead_id = created.lead_id.unwrap();

    // O lead pertence ao admin (usuário responsável do webhook)
    let page = state
        .lead_service
        .list_leads(&scope(&clinic.admin), &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.items[0].lead.source, "n8n");
    assert_eq!(page.items[0].lead.status, LeadStatus::Novo);

    // O reenvio do n8n não é deduplicado
    for _ in 0..2 {
        state
            .webhook_service
            .ingest(
                WebhookRequest {
                    event_type: Some("lead_qualified".to_string()),
                    organization_id: Some(clinic.org.id.to_string()),
                    data: json!({ "leadId": lead_id }),
                },
                Some(N8N_SECRET),
            )
            .await
            .unwrap();
    }

    let scheduled_at = (Utc::now() + ChronoDuration::days(2)).to_rfc3339();
    let booked = state
        .webhook_service
        .ingest(
            WebhookRequest {
                event_type: Some("appointment_created".to_string()),
                organization_id: Some(clinic.org.id.to_string()),
                data: json!({ "leadId": lead_id, "scheduledAt": scheduled_at }),
            },
            Some(N8N_SECRET),
        )
        .await
        .unwrap();
    assert!(booked.appointment_id.is_some());

    let page = state
        .lead_service
        .list_leads(&scope(&clinic.admin), &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items[0].lead.status, LeadStatus::Agendado);
    assert_eq!(page.items[0].last_appointment_id, booked.appointment_id);

    assert_eq!(count_events(&pool, clinic.org.id, "lead_received").await, 1);
    assert_eq!(count_events(&pool, clinic.org.id, "qualified").await, 2);
    assert_eq!(count_events(&pool, clinic.org.id, "scheduled").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn dashboard_funnel_from_lead_to_no_show(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-x").await;
    let op = scope(&clinic.operador);

    let lead = state.lead_service.create_lead(&op, maria()).await.unwrap();
    assert_eq!(lead.status, LeadStatus::Novo);
    assert_eq!(count_events(&pool, clinic.org.id, "lead_received").await, 1);

    let qualified = state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Qualificado, None)
        .await
        .unwrap();
    assert_eq!(qualified.status, LeadStatus::Qualificado);

    let (from, to) = (Utc::now() - ChronoDuration::hours(1), Utc::now() + ChronoDuration::hours(1));
    let summary = state.metrics_service.summarize(&op, from, to).await.unwrap();
    assert_eq!(summary.qualified, 1);

    let appointment = state
        .appointment_service
        .create_appointment(&op, lead.id, "2025-03-01T10:00:00Z", None)
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Agendado);
    assert_eq!(appointment.organization_id, clinic.org.id);

    let cards = state.metrics_service.dashboard_cards(&op).await.unwrap();
    assert_eq!(cards.total_leads, 1);
    assert_eq!(cards.scheduled_appointments, 1);

    let missed = state
        .appointment_service
        .transition_status(&op, appointment.id, AppointmentStatus::NoShow, None)
        .await
        .unwrap();
    assert_eq!(missed.status, AppointmentStatus::NoShow);

    let cards = state.metrics_service.dashboard_cards(&op).await.unwrap();
    assert_eq!(cards.scheduled_appointments, 0);

    assert_eq!(count_events(&pool, clinic.org.id, "scheduled").await, 1);
    assert_eq!(count_events(&pool, clinic.org.id, "no_show").await, 1);

    // Super admin sem organização escolhida: leituras vazias, escrita recusada
    let root_scope = TenantScope::resolve(&root, None).unwrap();
    let empty = state
        .lead_service
        .list_leads(&root_scope, &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    let write = state.lead_service.create_lead(&root_scope, maria()).await;
    assert!(matches!(write, Err(AppError::OrganizationRequired)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn webhook_secret_and_unknown_organization(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;

    let request = |org: String| WebhookRequest {
        event_type: Some("new_lead".to_string()),
        organization_id: Some(org),
        data: json!({ "name": "Maria Silva", "phone": "11999990001" }),
    };

    let wrong_secret = state
        .webhook_service
        .ingest(request(clinic.org.id.to_string()), Some("outro-segredo-qualquer"))
        .await;
    assert!(matches!(wrong_secret, Err(AppError::InvalidWebhookSecret)));

    let unknown = state
        .webhook_service
        .ingest(request(Uuid::new_v4().to_string()), Some(N8N_SECRET))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound("organization.not_found"))));

    let malformed = state
        .webhook_service
        .ingest(request("nao-e-uuid".to_string()), Some(N8N_SECRET))
        .await;
    assert!(matches!(malformed, Err(AppError::NotFound("organization.not_found"))));

    assert_eq!(count_events(&pool, clinic.org.id, "lead_received").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn every_qualification_is_recorded(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let op = scope(&clinic.operador);

    let lead = state.lead_service.create_lead(&op, maria()).await.unwrap();
    assert_eq!(lead.source, "Instagram");

    state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Qualificado, None)
        .await
        .unwrap();
    // Repetir o status atualiza as notas e grava outro evento
    let again = state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Qualificado, Some("ligar amanhã"))
        .await
        .unwrap();
    assert_eq!(again.status, LeadStatus::Qualificado);
    assert_eq!(again.notes.as_deref(), Some("ligar amanhã"));
    assert_eq!(count_events(&pool, clinic.org.id, "qualified").await, 2);

    let direct = state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Agendado, None)
        .await;
    assert!(matches!(direct, Err(AppError::BadRequest("lead.scheduled_via_appointment"))));

    // Perdido não é terminal
    state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Perdido, None)
        .await
        .unwrap();
    let back = state
        .lead_service
        .transition_status(&op, lead.id, LeadStatus::Novo, None)
        .await
        .unwrap();
    assert_eq!(back.status, LeadStatus::Novo);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn appointment_lifecycle_and_terminal_states(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let op = scope(&clinic.operador);

    let lead = state.lead_service.create_lead(&op, maria()).await.unwrap();

    let bad_date = state
        .appointment_service
        .create_appointment(&op, lead.id, "amanhã cedo", None)
        .await;
    assert!(matches!(bad_date, Err(AppError::BadRequest("appointment.invalid_scheduled_at"))));

    let appointment = state
        .appointment_service
        .create_appointment(&op, lead.id, "2030-03-01T10:00:00Z", Some("primeira consulta"))
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Agendado);

    state
        .appointment_service
        .transition_status(&op, appointment.id, AppointmentStatus::Confirmado, None)
        .await
        .unwrap();
    state
        .appointment_service
        .transition_status(&op, appointment.id, AppointmentStatus::Realizado, None)
        .await
        .unwrap();

    let reopen = state
        .appointment_service
        .transition_status(&op, appointment.id, AppointmentStatus::Cancelado, None)
        .await;
    assert!(matches!(reopen, Err(AppError::BadRequest("appointment.terminal_status"))));

    let second = state
        .appointment_service
        .create_appointment(&op, lead.id, "2030-03-08T10:00:00Z", None)
        .await
        .unwrap();
    state
        .appointment_service
        .transition_status(&op, second.id, AppointmentStatus::NoShow, None)
        .await
        .unwrap();
    let repeated = state
        .appointment_service
        .transition_status(&op, second.id, AppointmentStatus::NoShow, Some("não atendeu"))
        .await
        .unwrap();
    assert_eq!(repeated.notes.as_deref(), Some("não atendeu"));

    let third = state
        .appointment_service
        .create_appointment(&op, lead.id, "2030-03-15T10:00:00Z", None)
        .await
        .unwrap();
    let deleted = state.appointment_service.delete_appointment(&op, third.id).await.unwrap();
    assert_eq!(deleted.id, third.id);

    assert_eq!(count_events(&pool, clinic.org.id, "scheduled").await, 3);
    assert_eq!(count_events(&pool, clinic.org.id, "no_show").await, 3);
    assert_eq!(count_events(&pool, clinic.org.id, "conversion").await, 0);

    let agenda = state
        .appointment_service
        .list_appointments(&op, AppointmentFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(agenda.meta.total, 2);
    assert!(agenda.items[0].appointment.scheduled_at <= agenda.items[1].appointment.scheduled_at);
    assert_eq!(agenda.items[0].lead.name, "Maria Silva");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn tenants_never_see_each_other(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let a = setup_clinic(&state, &root, "clinica-a").await;
    let b = setup_clinic(&state, &root, "clinica-b").await;

    let lead = state.lead_service.create_lead(&scope(&a.operador), maria()).await.unwrap();

    let other = state
        .lead_service
        .transition_status(&scope(&b.admin), lead.id, LeadStatus::Qualificado, None)
        .await;
    assert!(matches!(other, Err(AppError::NotFound("lead.not_found"))));

    let booking = state
        .appointment_service
        .create_appointment(&scope(&b.operador), lead.id, "2030-03-01T10:00:00Z", None)
        .await;
    assert!(matches!(booking, Err(AppError::NotFound("lead.not_found"))));

    let page = state
        .lead_service
        .list_leads(&scope(&b.operador), &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 0);

    // Pedir outra organização sem ser super admin é 403
    let crossing = TenantScope::resolve(&b.admin, Some(a.org.id));
    assert!(matches!(crossing, Err(AppError::AccessDenied("access.denied_organization"))));

    // O super admin enxerga a organização que pedir
    let root_scope = TenantScope::resolve(&root, Some(a.org.id)).unwrap();
    let summary = state
        .metrics_service
        .summarize(&root_scope, Utc::now() - ChronoDuration::days(1), Utc::now())
        .await
        .unwrap();
    assert_eq!(summary.leads_received, 1);

    let b_summary = state
        .metrics_service
        .summarize(&scope(&b.admin), Utc::now() - ChronoDuration::days(1), Utc::now())
        .await
        .unwrap();
    assert_eq!(b_summary.leads_received, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn lead_listing_paginates_and_filters(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let op = scope(&clinic.operador);

    for i in 0..12 {
        let lead = NewLead {
            name: format!("Paciente {:02}", i),
            phone: format!("1190000{:04}", i),
            ..NewLead::default()
        };
        state.lead_service.create_lead(&op, lead).await.unwrap();
    }
    state.lead_service.create_lead(&op, maria()).await.unwrap();

    let second = state
        .lead_service
        .list_leads(&op, &LeadFilters::default(), Pagination::new(Some(2), Some(10)))
        .await
        .unwrap();
    assert_eq!(second.meta.total, 13);
    assert_eq!(second.meta.total_pages, 2);
    assert_eq!(second.items.len(), 3);

    let search = LeadFilters { status: None, search: Some("maria".to_string()) };
    let found = state.lead_service.list_leads(&op, &search, Pagination::default()).await.unwrap();
    assert_eq!(found.meta.total, 1);
    assert_eq!(found.items[0].lead.name, "Maria Silva");

    // Curingas do LIKE são texto literal
    let wildcard = LeadFilters { status: None, search: Some("%".to_string()) };
    let none = state.lead_service.list_leads(&op, &wildcard, Pagination::default()).await.unwrap();
    assert_eq!(none.meta.total, 0);

    let missing_phone = state
        .lead_service
        .create_lead(&op, NewLead { name: "Sem Telefone".to_string(), ..NewLead::default() })
        .await;
    assert!(matches!(missing_phone, Err(AppError::BadRequest("lead.name_phone_required"))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn failed_booking_leaves_no_trace(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let op = scope(&clinic.operador);

    let lead = state.lead_service.create_lead(&op, maria()).await.unwrap();
    let result = state
        .appointment_service
        .create_appointment(&op, lead.id, "data-invalida", None)
        .await;
    assert!(result.is_err());

    let page = state
        .lead_service
        .list_leads(&op, &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items[0].lead.status, LeadStatus::Novo);
    assert_eq!(count_events(&pool, clinic.org.id, "scheduled").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn metric_ledger_is_append_only(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;

    let event = state
        .metrics_service
        .record_external(&scope(&clinic.admin), MetricEventType::FollowUp, json!({ "canal": "whatsapp" }))
        .await
        .unwrap();

    let update = sqlx::query("UPDATE metric_events SET metadata = '{}'::jsonb WHERE id = $1")
        .bind(event.id)
        .execute(&pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM metric_events WHERE id = $1")
        .bind(event.id)
        .execute(&pool)
        .await;
    assert!(delete.is_err());

    assert_eq!(count_events(&pool, clinic.org.id, "follow_up").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn only_admins_manage_people_and_only_root_manages_clinics(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;

    let by_operador = state
        .auth_service
        .create_user(
            &clinic.operador,
            &CreateUserPayload {
                name: "Outro".to_string(),
                email: "outro@clinica-a.com".to_string(),
                password: "senha-forte".to_string(),
                role: None,
                organization_id: None,
            },
        )
        .await;
    assert!(matches!(by_operador, Err(AppError::AccessDenied("access.denied_role"))));

    let duplicate_email = state
        .auth_service
        .create_user(
            &clinic.admin,
            &CreateUserPayload {
                name: "Recepção 2".to_string(),
                email: " Recepcao@Clinica-A.com ".to_string(),
                password: "senha-forte".to_string(),
                role: None,
                organization_id: None,
            },
        )
        .await;
    assert!(matches!(duplicate_email, Err(AppError::EmailAlreadyExists)));

    let duplicate_slug = state
        .organization_service
        .create_organization(
            &root,
            &CreateOrganizationPayload {
                name: "Outra".to_string(),
                slug: "Clinica-A".to_string(),
                webhook_url: None,
                whatsapp_link: None,
                webhook_secret: None,
                metadata: None,
            },
        )
        .await;
    assert!(matches!(duplicate_slug, Err(AppError::SlugAlreadyExists)));

    let overview = state.organization_service.list_with_counts(&root).await.unwrap();
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].user_count, 2);

    let token = state.auth_service.login_user("RECEPCAO@clinica-a.com", "senha-forte").await.unwrap();
    let me = state.auth_service.validate_token(&token).await.unwrap();
    assert_eq!(me.id, clinic.operador.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn overtime_series_and_today_cards(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let op = scope(&clinic.operador);

    let first = state.lead_service.create_lead(&op, maria()).await.unwrap();
    let joao = state
        .lead_service
        .create_lead(
            &op,
            NewLead {
                name: "João Souza".to_string(),
                phone: "11999990002".to_string(),
                procedure: None,
                source: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    state
        .lead_service
        .transition_status(&op, joao.id, LeadStatus::Qualificado, None)
        .await
        .unwrap();

    // Horários "ingênuos" são lidos no fuso local do servidor
    let today = Local::now().date_naive();
    for day in [today - ChronoDuration::days(1), today, today + ChronoDuration::days(1)] {
        state
            .appointment_service
            .create_appointment(&op, first.id, &format!("{}T12:00:00", day), None)
            .await
            .unwrap();
    }

    let cards = state.metrics_service.dashboard_cards(&op).await.unwrap();
    assert_eq!(cards.total_leads, 2);
    assert_eq!(cards.qualified_leads, 1);
    assert_eq!(cards.scheduled_appointments, 3);
    assert_eq!(cards.today_appointments, 1);

    let from = Utc::now() - ChronoDuration::days(1);
    let to = Utc::now() + ChronoDuration::days(1);
    let total_of = |series: &[TimeSeriesPoint], event_type: MetricEventType| {
        series
            .iter()
            .filter(|point| point.event_type == event_type)
            .map(|point| point.count)
            .sum::<i64>()
    };

    let series = state.metrics_service.time_series(&op, from, to, None).await.unwrap();
    assert_eq!(total_of(&series, MetricEventType::LeadReceived), 2);
    assert_eq!(total_of(&series, MetricEventType::Qualified), 1);
    assert_eq!(total_of(&series, MetricEventType::Scheduled), 3);
    assert_eq!(total_of(&series, MetricEventType::NoShow), 0);
    assert!(series.windows(2).all(|pair| (pair[0].date, pair[0].event_type) < (pair[1].date, pair[1].event_type)));

    let scheduled_only = state
        .metrics_service
        .time_series(&op, from, to, Some(MetricEventType::Scheduled))
        .await
        .unwrap();
    assert!(!scheduled_only.is_empty());
    assert!(scheduled_only.iter().all(|point| point.event_type == MetricEventType::Scheduled));
    assert_eq!(total_of(&scheduled_only, MetricEventType::Scheduled), 3);

    // Outra clínica não enxerga nada disso
    let other = setup_clinic(&state, &root, "clinica-b").await;
    let empty = state
        .metrics_service
        .time_series(&scope(&other.operador), from, to, None)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

async fn bearer_for(server: &TestServer, email: &str) -> HeaderValue {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": "senha-forte" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn foreign_organization_header_is_forbidden_over_http(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let a = setup_clinic(&state, &root, "clinica-a").await;
    let b = setup_clinic(&state, &root, "clinica-b").await;
    let server = TestServer::new(create_app(state.clone())).unwrap();
    let auth = bearer_for(&server, &a.operador.email).await;

    let own = server
        .get("/api/leads")
        .add_header(header::AUTHORIZATION, auth.clone())
        .add_header(
            HeaderName::from_static("x-organization-id"),
            HeaderValue::from_str(&a.org.id.to_string()).unwrap(),
        )
        .await;
    assert_eq!(own.status_code(), StatusCode::OK);

    for path in ["/api/leads", "/api/agendamentos", "/api/metricas"] {
        let response = server
            .get(path)
            .add_header(header::AUTHORIZATION, auth.clone())
            .add_header(
                HeaderName::from_static("x-organization-id"),
                HeaderValue::from_str(&b.org.id.to_string()).unwrap(),
            )
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN, "rota {}", path);
        let body: Value = response.json();
        assert_eq!(body["error"], "Acesso negado: usuário não pertence a esta organização");
    }

    let by_query = server
        .get(&format!("/api/metricas?organizationId={}", b.org.id))
        .add_header(header::AUTHORIZATION, auth)
        .await;
    assert_eq!(by_query.status_code(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn malformed_dashboard_input_is_a_json_bad_request(pool: PgPool) {
    let (state, root) = setup(pool.clone()).await;
    let clinic = setup_clinic(&state, &root, "clinica-a").await;
    let lead = state.lead_service.create_lead(&scope(&clinic.operador), maria()).await.unwrap();
    let server = TestServer::new(create_app(state.clone())).unwrap();
    let auth = bearer_for(&server, &clinic.operador.email).await;

    let unknown_status = server
        .patch(&format!("/api/leads/{}", lead.id))
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "status": "convertido" }))
        .await;
    assert_eq!(unknown_status.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = unknown_status.json();
    assert_eq!(body["error"], "Corpo da requisição inválido.");
    assert!(body["details"]["body"][0].as_str().unwrap().contains("convertido"));

    let missing_lead_id = server
        .post("/api/agendamentos")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "scheduledAt": "2030-03-01T10:00:00Z" }))
        .await;
    assert_eq!(missing_lead_id.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = missing_lead_id.json();
    assert_eq!(body["error"], "Corpo da requisição inválido.");

    for path in ["/api/leads?status=foo", "/api/agendamentos?status=pendente", "/api/metricas?period=60d"] {
        let response = server.get(path).add_header(header::AUTHORIZATION, auth.clone()).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "rota {}", path);
        let body: Value = response.json();
        assert_eq!(body["error"], "Parâmetros de consulta inválidos.");
        assert!(body["details"]["query"].is_array());
    }

    let bad_id = server
        .patch("/api/agendamentos/abc")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "status": "confirmado" }))
        .await;
    assert_eq!(bad_id.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = bad_id.json();
    assert_eq!(body["error"], "Identificador inválido na URL.");

    // Nada foi gravado pelas requisições rejeitadas
    assert_eq!(count_events(&pool, clinic.org.id, "lead_received").await, 1);
    assert_eq!(count_events(&pool, clinic.org.id, "scheduled").await, 0);
    let unchanged = state
        .lead_service
        .list_leads(&scope(&clinic.operador), &LeadFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(unchanged.items[0].lead.status, LeadStatus::Novo);
}
