use serde_json::json;
use spacehook::{run_plugin, CapabilitySet};

const WHOAMI: &str = r#"
query {
  viewer {
    id
  }
}
"#;

const TRIGGER_RUN: &str = r#"
mutation Run($stackID: ID!) {
  runResourceCreate(stack: $stackID, proposed: false) {
    id
  }
}
"#;

fn main() -> anyhow::Result<()> {
    run_plugin(CapabilitySet::all(), |injected| {
        let logger = injected.logger()?;

        logger.log("Hello, world!");
        // only shown when SPACELIFT_DEBUG is set
        logger.debug("This is a debug message.");
        logger.warn("This is a warning message.");
        logger.error("This is an error message.");

        // present after a plan has run
        logger.log(injected.plan_json()?);
        // present after an apply has run
        logger.log(injected.state_before_json()?);

        let api = injected.query_api()?;
        let whoami = api.query(WHOAMI, None)?;
        logger.log(format!("Hi, I am {}", whoami["data"]["viewer"]["id"]));

        let trigger_run = api.query(TRIGGER_RUN, Some(json!({ "stackID": "archive-file" })))?;
        logger.log(trigger_run);

        Ok(())
    })
}
