//! Route wiring tests: the locations handed to clients resolve to handlers.

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use sqlx::postgres::PgPoolOptions;

use fieldops::forms::installation::InstallationForm;
use fieldops::forms::survey::SurveyForm;
use fieldops::forms::WizardSessions;
use fieldops::handlers;
use fieldops::models::record::PgRecordStore;
use fieldops::submission::record_location;

fn lazy_store() -> PgRecordStore {
    // Never connects: every request below is rejected before any query.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://fieldops@localhost/fieldops_test")
        .expect("lazy pool");
    PgRecordStore::new(pool)
}

#[actix_web::test]
async fn test_record_location_is_routed() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_store()))
            .app_data(web::Data::new(WizardSessions::<SurveyForm>::new()))
            .app_data(web::Data::new(WizardSessions::<InstallationForm>::new()))
            .service(handlers::form_exports::<SurveyForm>())
            .service(handlers::form_exports::<InstallationForm>()),
    )
    .await;

    for location in [record_location::<SurveyForm>(5), record_location::<InstallationForm>(9)] {
        let req = test::TestRequest::get().uri(&location).to_request();
        let resp = test::call_service(&app, req).await;
        // Reached the handler, which requires a signed-in user.
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{location}");
    }

    let req = test::TestRequest::get().uri("/surveys/nowhere/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
