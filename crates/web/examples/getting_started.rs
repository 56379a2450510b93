//! cargo run --example getting_started -- users 42
//! OMNI_ENV=production cargo run --example getting_started -- users me

use omni_web::middleware::DebugTrace;
use omni_web::{App, Config, Error, Interrupt, handler_fn, init_logging};
use serde_json::json;
use tracing::{Level, info};

fn main() -> Result<(), Error> {
    init_logging(Level::DEBUG).map_err(Error::handler)?;

    let config = Config::from_value(json!({
        "error": true,
        "timezone": "UTC",
        "site": { "name": "getting started" },
    }))?;
    let mut app = App::new(config)?;

    app.configure("development", |app| {
        app.set("site.banner", "[dev] ");
    });
    app.configure_any(|app, mode| {
        info!(mode, "configured");
        app.add(DebugTrace);
    });

    app.on_event("end", |app, _event| {
        info!(elapsed = ?app.run_time(), "request finished");
    });

    // wraps every route in a header and a footer
    app.add(handler_fn(|ctx, next| {
        let banner = ctx.config().get_str("site.banner").unwrap_or_default().to_owned();
        let site = ctx.config().get_str("site.name").unwrap_or_default().to_owned();
        ctx.write(format!("{banner}{site}\n"));
        next.call(ctx)?;
        ctx.write("\n-- bye\n");
        Ok(())
    }));

    app.on(
        "/users/:id",
        handler_fn(|ctx, _next| match ctx.param("id").map(str::to_owned) {
            Some(id) if id == "me" => ctx.pass(),
            Some(id) => {
                ctx.write(format!("user #{id}"));
                Ok(())
            }
            None => ctx.pass(),
        }),
    );
    app.on(
        "^/users/(.+)$",
        handler_fn(|ctx, _next| {
            ctx.write("you are not logged in");
            Ok(())
        }),
    );

    app.on(
        "/broken",
        handler_fn(|_ctx, _next| Err(Interrupt::fail("this route is always broken"))),
    );
    app.on_error(handler_fn(|ctx, _next| {
        let cause = ctx.failure().map(ToString::to_string).unwrap_or_default();
        ctx.write(format!("sorry: {cause}"));
        Ok(())
    }));

    app.run()
}
