use countdown_infra::CountdownContext;
use futures::future::join_all;
use std::fmt::Debug;
use tracing::error;

/// Subscriber is a side effect to a `UseCase`
///
/// It is going to act upon the response of the execution
/// of the `UseCase` if the execution was a success.
#[async_trait::async_trait]
pub trait Subscriber<U: UseCase>: Send + Sync {
    async fn notify(&self, e: &U::Response, ctx: &CountdownContext);
}

#[async_trait::async_trait]
pub trait UseCase: Debug + Send {
    type Response: Send + Sync;
    type Errors: Send;

    const NAME: &'static str;

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors>;

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>>
    where
        Self: Sized,
    {
        Default::default()
    }
}

#[tracing::instrument(name = "Executing usecase", skip(usecase, ctx), fields(usecase = U::NAME))]
pub async fn execute<U>(mut usecase: U, ctx: &CountdownContext) -> Result<U::Response, U::Errors>
where
    U: UseCase,
    U::Errors: Debug,
{
    let res = usecase.execute(ctx).await;

    match &res {
        Ok(res) => {
            let subscribers = U::subscribers();
            let mut subscriber_promises = Vec::with_capacity(subscribers.len());
            for subscriber in &subscribers {
                subscriber_promises.push(subscriber.notify(res, ctx));
            }
            join_all(subscriber_promises).await;
        }
        Err(e) => {
            error!("{} failed: {:?}", U::NAME, e);
        }
    }

    res
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NOTIFIED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Halve(i64);

    struct CountNotifications;

    #[async_trait::async_trait]
    impl Subscriber<Halve> for CountNotifications {
        async fn notify(&self, _: &i64, _: &CountdownContext) {
            NOTIFIED.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl UseCase for Halve {
        type Response = i64;

        type Errors = String;

        const NAME: &'static str = "Halve";

        async fn execute(&mut self, _: &CountdownContext) -> Result<i64, String> {
            if self.0 % 2 == 0 {
                Ok(self.0 / 2)
            } else {
                Err(format!("{} is odd", self.0))
            }
        }

        fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
            vec![Box::new(CountNotifications)]
        }
    }

    #[actix_web::main]
    #[test]
    async fn notifies_subscribers_only_on_success() {
        let ctx = CountdownContext::create_inmemory();

        assert_eq!(execute(Halve(4), &ctx).await, Ok(2));
        assert_eq!(NOTIFIED.load(Ordering::SeqCst), 1);

        assert!(execute(Halve(3), &ctx).await.is_err());
        assert_eq!(NOTIFIED.load(Ordering::SeqCst), 1);
    }
}
