//! cargo run --example hello_world -- hello world
//!
//! Run as a CGI program (with `REQUEST_METHOD` set) the same routes answer HTTP requests.

use omni_web::{App, Config, Error, handler_fn};

fn main() -> Result<(), Error> {
    let mut app = App::new(Config::new())?;

    app.on(
        "/",
        handler_fn(|ctx, _next| {
            ctx.write("hello world\n");
            Ok(())
        }),
    );

    app.on(
        "/hello/:name",
        handler_fn(|ctx, _next| {
            let name = ctx.param("name").unwrap_or("stranger").to_owned();
            ctx.write(format!("hello {name}\n"));
            Ok(())
        }),
    );

    app.run()
}
