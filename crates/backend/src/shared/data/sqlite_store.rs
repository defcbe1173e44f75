use async_trait::async_trait;
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a002_subdimension::aggregate::Subdimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::IndicatorResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use super::store::{KpiStore, PeriodOrder, ResultQuery, StoreError};

mod dimensiones {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "dimensiones")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub nombre: String,
        pub peso: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

mod subdimensiones {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "subdimensiones")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub nombre: String,
        pub nombre_dimension: String,
        pub peso: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

mod definicion_indicadores {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "definicion_indicadores")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub nombre: String,
        pub nombre_subdimension: String,
        pub importancia: Option<String>,
        pub formula: Option<String>,
        pub fuente: Option<String>,
        pub origen_indicador: Option<String>,
        pub activo: Option<bool>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

mod resultado_indicadores {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "resultado_indicadores")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub nombre_indicador: String,
        pub pais: Option<String>,
        pub periodo: Option<i32>,
        pub valor_calculado: Option<f64>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Definition row for deployments whose table has no `activo` column.
#[derive(Debug, FromQueryResult)]
struct DefinitionWithoutActive {
    nombre: String,
    nombre_subdimension: String,
    importancia: Option<String>,
    formula: Option<String>,
    fuente: Option<String>,
    origen_indicador: Option<String>,
}

impl From<dimensiones::Model> for Dimension {
    fn from(m: dimensiones::Model) -> Self {
        Dimension::new(m.nombre, m.peso)
    }
}

impl From<subdimensiones::Model> for Subdimension {
    fn from(m: subdimensiones::Model) -> Self {
        Subdimension {
            name: m.nombre,
            dimension_name: m.nombre_dimension,
            weight: m.peso,
        }
    }
}

impl From<definicion_indicadores::Model> for IndicatorDefinition {
    fn from(m: definicion_indicadores::Model) -> Self {
        IndicatorDefinition {
            name: m.nombre,
            subdimension_name: m.nombre_subdimension,
            importance: m.importancia,
            formula: m.formula,
            source: m.fuente,
            origin: m.origen_indicador,
            active: m.activo,
        }
    }
}

impl From<DefinitionWithoutActive> for IndicatorDefinition {
    fn from(m: DefinitionWithoutActive) -> Self {
        IndicatorDefinition {
            name: m.nombre,
            subdimension_name: m.nombre_subdimension,
            importance: m.importancia,
            formula: m.formula,
            source: m.fuente,
            origin: m.origen_indicador,
            active: None,
        }
    }
}

impl From<resultado_indicadores::Model> for IndicatorResult {
    fn from(m: resultado_indicadores::Model) -> Self {
        IndicatorResult {
            indicator_name: m.nombre_indicador,
            territory: m.pais.unwrap_or_default(),
            period: m.periodo,
            value: m.valor_calculado,
        }
    }
}

/// `KpiStore` over a local SQLite database through sea-orm.
#[derive(Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(query: &ResultQuery) -> Select<resultado_indicadores::Entity> {
        use resultado_indicadores::Column;

        let mut select = resultado_indicadores::Entity::find()
            .filter(Column::NombreIndicador.eq(query.indicator.as_str()));
        if !query.territories.is_empty() {
            select = select.filter(Column::Pais.is_in(query.territories.iter().cloned()));
        }
        if let Some(period) = query.period {
            select = select.filter(Column::Periodo.eq(period));
        }
        select
    }
}

#[async_trait]
impl KpiStore for SqliteStore {
    async fn dimensions(&self) -> Result<Vec<Dimension>, StoreError> {
        let models = dimensiones::Entity::find()
            .order_by_desc(dimensiones::Column::Peso)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn subdimensions(&self) -> Result<Vec<Subdimension>, StoreError> {
        let models = subdimensiones::Entity::find()
            .order_by_asc(subdimensiones::Column::NombreDimension)
            .order_by_asc(subdimensiones::Column::Peso)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn indicator_definitions(
        &self,
        with_active: bool,
    ) -> Result<Vec<IndicatorDefinition>, StoreError> {
        use definicion_indicadores::Column;

        if with_active {
            let models = definicion_indicadores::Entity::find()
                .order_by_asc(Column::Nombre)
                .all(&self.db)
                .await?;
            return Ok(models.into_iter().map(Into::into).collect());
        }

        let rows = definicion_indicadores::Entity::find()
            .select_only()
            .columns([
                Column::Nombre,
                Column::NombreSubdimension,
                Column::Importancia,
                Column::Formula,
                Column::Fuente,
                Column::OrigenIndicador,
            ])
            .order_by_asc(Column::Nombre)
            .into_model::<DefinitionWithoutActive>()
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn indicator_names(&self, subdimension: &str) -> Result<Vec<String>, StoreError> {
        use definicion_indicadores::Column;

        let names = definicion_indicadores::Entity::find()
            .select_only()
            .column(Column::Nombre)
            .filter(Column::NombreSubdimension.eq(subdimension))
            .order_by_asc(Column::Nombre)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(names)
    }

    async fn results(&self, query: &ResultQuery) -> Result<Vec<IndicatorResult>, StoreError> {
        use resultado_indicadores::Column;

        let mut select = Self::filtered(query);
        select = match query.order {
            PeriodOrder::Unordered => select.order_by_asc(Column::Id),
            // SQLite sorts nulls first ascending; keep them last in both directions
            PeriodOrder::Ascending => select
                .order_by_asc(Expr::col(Column::Periodo).is_null())
                .order_by_asc(Column::Periodo),
            PeriodOrder::Descending => select.order_by_desc(Column::Periodo),
        };
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let models = select.all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_results(&self, query: &ResultQuery) -> Result<u64, StoreError> {
        let count = Self::filtered(query).count(&self.db).await?;
        Ok(count)
    }
}
