// src/services/sales_service.rs

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::{Acquire, Postgres};
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::{SalesRepository, sales_repo::OptionColumn},
    models::{
        filter::FilterCriteria,
        sales::{FilterOptions, PAGE_SIZE, SaleRecord, SalesPage, split_tags},
    },
    services::sales_query::{self, PageWindow},
};

/// Como as consultas são atendidas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Filtro, ordenação e paginação empurrados para o Postgres a cada requisição.
    Live,
    /// Tabela carregada uma vez em memória, até alguém invalidar.
    Snapshot,
}

impl FromStr for QueryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(QueryMode::Live),
            "snapshot" => Ok(QueryMode::Snapshot),
            other => Err(anyhow::anyhow!(
                "SALES_QUERY_MODE inválido: '{}' (use 'live' ou 'snapshot')",
                other
            )),
        }
    }
}

/// Cache de leitura com ciclo de vida explícito. Vive dentro do `SalesService`.
#[derive(Clone, Default)]
pub struct SalesSnapshot {
    records: Arc<RwLock<Option<Arc<Vec<SaleRecord>>>>>,
}

impl SalesSnapshot {
    pub async fn current(&self) -> Option<Arc<Vec<SaleRecord>>> {
        self.records.read().await.clone()
    }

    /// Retorna `true` se havia algo carregado.
    pub async fn invalidate(&self) -> bool {
        self.records.write().await.take().is_some()
    }
}

#[derive(Clone)]
pub struct SalesService {
    repo: SalesRepository,
    mode: QueryMode,
    snapshot: SalesSnapshot,
}

impl SalesService {
    pub fn new(repo: SalesRepository, mode: QueryMode) -> Self {
        Self {
            repo,
            mode,
            snapshot: SalesSnapshot::default(),
        }
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub async fn query<'e, E>(
        &self,
        executor: E,
        criteria: &FilterCriteria,
    ) -> Result<SalesPage, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        match self.mode {
            QueryMode::Live => self.query_live(executor, criteria).await,
            QueryMode::Snapshot => {
                let records = self.snapshot_records(executor).await?;
                Ok(sales_query::run_query(&records, criteria))
            }
        }
    }

    pub async fn filter_options<'e, E>(&self, executor: E) -> Result<FilterOptions, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        match self.mode {
            QueryMode::Live => self.filter_options_live(executor).await,
            QueryMode::Snapshot => {
                let records = self.snapshot_records(executor).await?;
                Ok(sales_query::collect_filter_options(&records))
            }
        }
    }

    pub async fn invalidate_cache(&self) {
        if self.snapshot.invalidate().await {
            tracing::info!("🗑️ Snapshot de vendas invalidado");
        }
    }

    // Contagem, resumo e página enxergam o mesmo snapshot do banco.
    async fn query_live<'e, E>(
        &self,
        executor: E,
        criteria: &FilterCriteria,
    ) -> Result<SalesPage, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total_items = self.repo.count(&mut *tx, criteria).await?;
        let window = PageWindow::new(criteria.page, PAGE_SIZE, total_items);
        let summary = self.repo.summary(&mut *tx, criteria).await?;
        let data = self.repo.fetch_page(&mut *tx, criteria, &window).await?;

        tx.commit().await?;

        Ok(SalesPage {
            data,
            page: window.page,
            page_size: window.page_size,
            total_items: window.total_items,
            total_pages: window.total_pages,
            summary,
        })
    }

    async fn filter_options_live<'e, E>(&self, executor: E) -> Result<FilterOptions, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let regions = self.repo.distinct_values(&mut *tx, OptionColumn::Region).await?;
        let genders = self.repo.distinct_values(&mut *tx, OptionColumn::Gender).await?;
        let categories = self
            .repo
            .distinct_values(&mut *tx, OptionColumn::ProductCategory)
            .await?;
        let payment_methods = self
            .repo
            .distinct_values(&mut *tx, OptionColumn::PaymentMethod)
            .await?;
        let raw_tags = self.repo.raw_tags(&mut *tx).await?;

        tx.commit().await?;

        // Ordena aqui para bater com o modo snapshot, independente da collation do banco.
        let tags: BTreeSet<String> = raw_tags.iter().flat_map(|raw| split_tags(raw)).collect();

        Ok(FilterOptions {
            regions: sorted(regions),
            genders: sorted(genders),
            product_categories: sorted(categories),
            tags: tags.into_iter().collect(),
            payment_methods: sorted(payment_methods),
        })
    }

    async fn snapshot_records<'e, E>(&self, executor: E) -> Result<Arc<Vec<SaleRecord>>, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if let Some(records) = self.snapshot.current().await {
            return Ok(records);
        }

        // Segura o write lock durante a carga para só uma requisição ir ao banco.
        let mut guard = self.snapshot.records.write().await;
        if let Some(records) = guard.as_ref() {
            return Ok(records.clone());
        }

        let mut conn = executor.acquire().await?;
        let records = Arc::new(self.repo.fetch_all(&mut *conn).await?);
        tracing::info!("📊 {} vendas carregadas no snapshot", records.len());

        *guard = Some(records.clone());
        Ok(records)
    }
}

fn sorted(values: Vec<String>) -> Vec<String> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
