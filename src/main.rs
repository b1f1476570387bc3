use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

use rideshare_backend::config::environment::{EnvironmentConfig, StorageBackend};
use rideshare_backend::database::DatabaseConnection;
use rideshare_backend::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚕 Rideshare Backend");
    info!("================================================");

    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuración inválida: {:#}", e);
            return Err(e);
        }
    };

    let app_state = match config.storage {
        StorageBackend::Postgres => {
            let db_connection = match DatabaseConnection::new_default().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };

            if config.run_migrations {
                db_connection.run_migrations().await?;
            }

            AppState::postgres(db_connection.pool().clone(), config.clone())
        }
        StorageBackend::Memory => {
            warn!("⚠️ STORAGE=memory: los datos se pierden al reiniciar");
            AppState::in_memory(config.clone())
        }
    };

    let app = create_router(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("👤 Usuarios:");
    info!("   POST /api/users/register - Registro");
    info!("   POST /api/users/login - Login");
    info!("   POST /api/token/refresh - Refrescar access token");
    info!("   GET  /api/users/profile - Usuario actual");
    info!("   GET  /api/passengers/me - Perfil de pasajero");
    info!("🚗 Conductores:");
    info!("   GET  /api/drivers/me - Perfil de conductor");
    info!("   POST /api/drivers/go_online | go_offline - Disponibilidad");
    info!("   POST/GET /api/drivers/vehicles - Vehículos");
    info!("🚕 Viajes:");
    info!("   GET  /api/rides - Listar viajes (?status=)");
    info!("   POST /api/rides/request_ride - Solicitar viaje");
    info!("   GET  /api/rides/:id - Detalle de viaje");
    info!("   POST /api/rides/:id/accept_ride | start_ride | complete_ride | cancel_ride");
    info!("   GET  /api/rides/:id/locations | ratings");
    info!("   POST /api/locations/update_location - Breadcrumb");
    info!("   POST /api/ratings/rate_ride - Calificar viaje");
    info!("💳 Pagos:");
    info!("   POST /api/payments/rides/:id/settle - Liquidar viaje");
    info!("   GET  /api/payments/rides/:id/invoice - Invoice");
    info!("   GET  /api/payments/transactions - Transacciones");
    info!("   POST/GET /api/payments/methods - Métodos de pago");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
